//! Error types for the bean container and the advice layer

use std::fmt;
use thiserror::Error;

/// Boxed error returned by user-supplied constructors, setters, hooks and
/// proxied target methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The step of bean construction that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionStage {
    /// Allocating the instance (explicit or zero-argument constructor)
    Constructor,
    /// Applying the named setter
    Setter(String),
    /// Running the named init hook
    InitHook(String),
}

impl fmt::Display for InjectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor => f.write_str("constructor"),
            Self::Setter(name) => write!(f, "setter `{name}`"),
            Self::InitHook(name) => write!(f, "init hook `{name}`"),
        }
    }
}

/// Errors that can occur while registering, resolving or destroying beans
#[derive(Error, Debug)]
pub enum ContainerError {
    /// A definition with this id is already registered
    #[error("Bean definition already registered: {id}")]
    DuplicateDefinition { id: String },

    /// No definition is registered under this id
    #[error("No bean named '{id}' is registered")]
    NotFound { id: String },

    /// A by-type dependency matched no registered definition
    #[error("No bean definition found for type: {type_name}")]
    NoCandidate { type_name: &'static str },

    /// Circular dependency that cannot be broken with an early reference
    #[error("Circular dependency detected while creating: {id}")]
    CircularDependency { id: String },

    /// A constructor, setter or init hook failed
    #[error("Failed to create bean '{id}' in {stage}: {source}")]
    InjectionFailure {
        id: String,
        stage: InjectionStage,
        #[source]
        source: BoxError,
    },

    /// A destroy hook failed
    #[error("Destroy hook `{hook}` failed for bean '{id}': {source}")]
    HookInvocation {
        id: String,
        hook: String,
        #[source]
        source: BoxError,
    },

    /// The bean exists but is not of the requested type
    #[error("Bean '{id}' is not of type {expected}")]
    TypeMismatch { id: String, expected: &'static str },
}

impl ContainerError {
    #[inline]
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_owned() }
    }

    #[inline]
    pub(crate) fn circular(id: &str) -> Self {
        Self::CircularDependency { id: id.to_owned() }
    }

    #[inline]
    pub(crate) fn injection(id: &str, stage: InjectionStage, source: BoxError) -> Self {
        Self::InjectionFailure {
            id: id.to_owned(),
            stage,
            source,
        }
    }

    #[inline]
    pub(crate) fn type_mismatch<T: ?Sized + 'static>(id: &str) -> Self {
        Self::TypeMismatch {
            id: id.to_owned(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` for `CircularDependency`
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// Returns `true` for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by the advice chain itself rather than by the proxied target
#[derive(Error, Debug)]
pub enum ProxyError {
    /// `proceed` was called again after the target had already been invoked
    #[error("Advice chain for `{method}` already reached the target")]
    ChainExhausted { method: &'static str },

    /// An advice short-circuited with a value of the wrong type
    #[error("Advice returned an unexpected value type for `{method}`")]
    ReturnTypeMismatch { method: &'static str },

    /// An advice failed with an error that is not the target's error type
    #[error("Advice failed during `{method}`: {source}")]
    Advice {
        method: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, ContainerError>;
