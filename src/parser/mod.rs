// Parser module: Python syntax trees and the queries run over them

mod python;
mod value;
pub mod walk;

pub use python::*;
pub use value::{extract_value, Value};
