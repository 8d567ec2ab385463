//! Error enrichment for `debug`/`error` records
//!
//! This module provides:
//! - `Fault`: a raised error or an arbitrary value handed to `error`/`debug`
//! - `ErrorPayload`: the normalized payload logged for a fault
//! - `RequestInfo` and `RequestContext`: the ambient request scope read at
//!   enrichment time

use super::log_context::{FieldValue, LogContext};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;

/// Environment variable naming the deployment environment
pub const ENV_VAR: &str = "APP_ENV";
const DEFAULT_ENV: &str = "development";
const VALUE_FAULT_TYPE: &str = "Error";

/// Something handed to `error`/`debug`: a raised error or a plain value
#[derive(Debug, Clone)]
pub enum Fault {
    Raised {
        type_name: String,
        message: String,
    },
    Value(FieldValue),
}

impl Fault {
    /// Capture a raised error, keeping its concrete type name
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        Fault::Raised {
            type_name: short.to_string(),
            message: err.to_string(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Fault::Raised { type_name, .. } => type_name,
            Fault::Value(_) => VALUE_FAULT_TYPE,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Fault::Raised { message, .. } => message.clone(),
            Fault::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for Fault {
    fn from(value: &str) -> Self {
        Fault::Value(value.into())
    }
}

impl From<String> for Fault {
    fn from(value: String) -> Self {
        Fault::Value(value.into())
    }
}

impl From<FieldValue> for Fault {
    fn from(value: FieldValue) -> Self {
        Fault::Value(value)
    }
}

impl From<LogContext> for Fault {
    fn from(value: LogContext) -> Self {
        Fault::Value(value.into())
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Fault::error(&err)
    }
}

impl From<super::error::LoggerError> for Fault {
    fn from(err: super::error::LoggerError) -> Self {
        Fault::error(&err)
    }
}

/// The concrete type is erased behind the box, so boxed errors are
/// labelled with the generic `Error` type name.
impl From<Box<dyn std::error::Error + Send + Sync>> for Fault {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Fault::Raised {
            type_name: "Error".to_string(),
            message: err.to_string(),
        }
    }
}

/// Authenticated user of the ambient request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: FieldValue,
    pub name: Option<String>,
}

/// Request-scoped values readable while enriching error records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub body: FieldValue,
    pub query: FieldValue,
    pub params: FieldValue,
    pub host: Option<String>,
    pub user: Option<UserInfo>,
    pub ip: Option<String>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, id: impl Into<FieldValue>, name: impl Into<String>) -> Self {
        self.user = Some(UserInfo {
            id: id.into(),
            name: Some(name.into()),
        });
        self
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<FieldValue>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<FieldValue>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: impl Into<FieldValue>) -> Self {
        self.params = params.into();
        self
    }

    /// `reqInfo` value captured at `servertime`
    fn to_req_info(&self, servertime: String) -> FieldValue {
        let req = LogContext::new()
            .with_field("req", self.method.as_str())
            .with_field("path", self.path.as_str())
            .with_field("body", self.body.clone())
            .with_field("query", self.query.clone())
            .with_field("params", self.params.clone())
            .with_field("host", self.host.clone());
        let user = match self.user {
            Some(ref user) => LogContext::new()
                .with_field("id", user.id.clone())
                .with_field("name", user.name.clone())
                .into(),
            None => FieldValue::Null,
        };
        let server = LogContext::new()
            .with_field("ip", self.ip.clone())
            .with_field("servertime", servertime);

        LogContext::new()
            .with_field("req", req)
            .with_field("user", user)
            .with_field("server", server)
            .into()
    }
}

thread_local! {
    static CURRENT_REQUEST: RefCell<Option<Arc<RequestInfo>>> = const { RefCell::new(None) };
}

/// Ambient request scope of the current thread
pub struct RequestContext;

impl RequestContext {
    /// Install `info` as the current request until the guard drops
    ///
    /// # Example
    ///
    /// ```
    /// use log_router::core::{RequestContext, RequestInfo};
    ///
    /// {
    ///     let _guard = RequestContext::enter(RequestInfo::new("GET", "/health"));
    ///     assert!(RequestContext::current().is_some());
    /// }
    /// assert!(RequestContext::current().is_none());
    /// ```
    pub fn enter(info: RequestInfo) -> RequestGuard {
        let previous = CURRENT_REQUEST.with(|cell| cell.borrow_mut().replace(Arc::new(info)));
        RequestGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    pub fn current() -> Option<Arc<RequestInfo>> {
        CURRENT_REQUEST.with(|cell| cell.borrow().clone())
    }
}

/// RAII guard restoring the previous request scope on drop
pub struct RequestGuard {
    previous: Option<Arc<RequestInfo>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_REQUEST.with(|cell| *cell.borrow_mut() = previous);
    }
}

/// Uniform payload logged by `error`/`debug`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub req_info: FieldValue,
    pub message: String,
    pub file_name: String,
    pub line_number: String,
    pub error_type: String,
    pub stack: String,
    pub env: String,
}

impl ErrorPayload {
    /// Normalize `fault` raised at `location`, reading the ambient request
    pub fn capture(fault: &Fault, location: &Location<'_>) -> Self {
        let request = RequestContext::current();
        Self::capture_with(fault, location, request.as_deref())
    }

    pub fn capture_with(
        fault: &Fault,
        location: &Location<'_>,
        request: Option<&RequestInfo>,
    ) -> Self {
        let message = fault.message();
        let error_type = fault.type_name().to_string();
        let file_name = location
            .file()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        let line_number = format!("{}:{}", location.line(), location.column());

        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => format!("{}: {}\n{}", error_type, message, backtrace),
            _ => format!(
                "{}: {}\n    at {}:{}:{}",
                error_type,
                message,
                location.file(),
                location.line(),
                location.column()
            ),
        };

        let req_info = request
            .map(|req| req.to_req_info(TimestampFormat::RecordTime.format_now()))
            .unwrap_or(FieldValue::Null);

        Self {
            req_info,
            message,
            file_name,
            line_number,
            error_type,
            stack,
            env: std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string()),
        }
    }

    /// Payload as flat record fields
    pub fn to_fields(&self) -> LogContext {
        LogContext::new()
            .with_field("reqInfo", self.req_info.clone())
            .with_field("message", self.message.as_str())
            .with_field("fileName", self.file_name.as_str())
            .with_field("lineNumber", self.line_number.as_str())
            .with_field("errorType", self.error_type.as_str())
            .with_field("stack", self.stack.as_str())
            .with_field("env", self.env.as_str())
    }
}
