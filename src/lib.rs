/// Table construction from raw columns and typed records.
pub mod builder;
/// Session protocol: requests, responses, connection and cluster failover.
pub mod client;
/// Binary wire codec for every data form.
pub mod codec;
/// Client settings loading.
pub mod config;
/// Logging setup (filters, console and file sinks).
pub mod logging;
/// Value model: scalars, vectors, pairs, matrices, sets, dictionaries, tables.
pub mod model;
/// Data type taxonomy, null sentinels and temporal/wide conversions.
pub mod types;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Table builders.
pub use builder::{
    table_from_raw_data, table_from_record, ColumnSource, ColumnSpec, ColumnTag, RawColumn,
};
/// Session API.
pub use client::{
    BehaviorOptions, ClientConfig, ClusterConfig, DolphinClient, Random, RoundRobin,
    SelectionPolicy, TableAppender,
};
/// Codec entry points.
pub use codec::{decode, encode, read_value, write_value, CodecConfig};
/// config
pub use crate::config::ClientSettings;
/// Error types and result alias.
pub use dolphindb_error::{DolphinResult, ErrorExt, StackError, StatusCode};
/// Logging.
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
/// Value forms and scalar constructors.
pub use model::{
    create_blob, create_bool, create_char, create_code, create_complex, create_date,
    create_datetime, create_decimal128, create_decimal32, create_decimal64, create_double,
    create_duration, create_float, create_function, create_int, create_int128, create_ip,
    create_long, create_month, create_nanotime, create_nanotimestamp, create_point,
    create_short, create_string, create_symbol, create_time, create_timestamp, create_uuid,
    create_void,
    del_constant, Dictionary, Matrix, Pair, Scalar, Set, Table, Value, Vector,
};
/// Data types and forms.
pub use types::{DataForm, DataType, WireOrder};
