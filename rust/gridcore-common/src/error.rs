use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn worker_closed(request: impl Into<String>) -> Error {
        Error(
            ErrorKind::WorkerClosed {
                request: request.into(),
            }
            .into(),
        )
    }

    pub fn callback<E>(context: impl Into<String>, source: E) -> Error
    where
        E: Into<StdErrorBoxed>,
    {
        Error(
            ErrorKind::Callback {
                context: context.into(),
                source: source.into(),
            }
            .into(),
        )
    }

    pub fn is_worker_closed(&self) -> bool {
        matches!(self.kind(), ErrorKind::WorkerClosed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("engine worker is gone, '{request}' was not processed")]
    WorkerClosed { request: String },

    #[error("batch callback failed ({context}): {source}")]
    Callback {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
