use std::{any::Any, error::Error};

use crate::StatusCode;

/// Общий трейт доменных ошибок клиента.
///
/// По [`StatusCode`] ошибки клиент решает, переключаться ли на другой узел
/// кластера и оставлять ли соединение рабочим. Трейт object-safe: корневая
/// ошибка [`crate::StackError`] хранится как `dyn ErrorExt`.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Без переопределения ошибка считается внутренней.
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Ссылка для downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use crate::{CodecError, StackError};

    #[derive(Debug)]
    struct Unclassified;

    impl fmt::Display for Unclassified {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "unclassified")
        }
    }

    impl Error for Unclassified {}

    impl ErrorExt for Unclassified {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что ошибка без своего статуса внутренняя и не
    /// повторяется на другом узле.
    #[test]
    fn test_default_status_is_internal() {
        let err = StackError::new(Unclassified);
        assert_eq!(err.status_code(), StatusCode::Internal);
        assert!(!err.is_retryable());
    }

    /// Тест проверяет downcast через `as_any` для ошибки кодека.
    #[test]
    fn test_as_any_downcast() {
        let err = CodecError::truncated("symbol base");
        let down = err.as_any().downcast_ref::<CodecError>();
        assert!(matches!(down, Some(CodecError::Truncated { what }) if what == "symbol base"));
        assert!(err.as_any().downcast_ref::<Unclassified>().is_none());
    }
}
