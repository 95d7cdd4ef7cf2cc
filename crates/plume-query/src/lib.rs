mod error;
mod parser;
mod path;
mod predicate;
mod projection;
mod value;

pub use error::QueryError;
pub use parser::parse_query;
pub use path::{get, pop, set};
pub use predicate::Predicate;
pub use projection::Projection;
pub use value::{compare_values, format_literal, quote_ident, values_equal, Document, Value};
