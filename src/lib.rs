pub mod cli;
pub mod config;
pub mod error;
pub mod introspect;
pub mod parser;
pub mod query;
pub mod schema;
pub mod seed;
pub mod store;
pub mod translate;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::StoreError;
pub use introspect::{describe_schema, SchemaDescription};
pub use parser::{Record, SqlValue};
pub use query::{execute, execute_untrusted, ResultSet};
pub use translate::{ask, Answer, ModelReply, TranslateError, Translator};
