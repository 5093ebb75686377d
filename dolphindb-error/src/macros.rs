/// Возвращает `Err(StackError)` из текущей функции.
///
/// `bail!(err)` принимает доменную ошибку, `bail!(code, "fmt", args..)`
/// собирает [`crate::GenericError`] с кодом и сообщением.
#[macro_export]
macro_rules! bail {
    ($err:expr $(,)?) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $($fmt:tt)+) => {
        return Err($crate::StackError::new($crate::GenericError::new(
            $code,
            format!($($fmt)+),
        )))
    };
}

/// `bail!`, если условие ложно. Формы те же, что у [`bail!`].
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($rest:tt)+) => {
        if !($cond) {
            $crate::bail!($($rest)+);
        }
    };
}

/// Контекст для `Result` с любой ошибкой, приводимой к [`crate::StackError`].
///
/// ```ignore
/// use dolphindb_error::ResultExt;
///
/// stream
///     .set_nodelay(true)
///     .map_err(ClientError::from)
///     .with_context(|| format!("configuring socket to {address}"))?;
/// ```
pub trait ResultExt<T> {
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;

    /// Строка контекста строится только при ошибке.
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
