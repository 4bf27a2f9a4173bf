pub mod cp437;
pub mod error;
pub mod importer;
pub mod parser;
pub mod writer;

pub use error::SieError;
pub use importer::{import, ImportStats};
pub use parser::{decode, parse, parse_bytes, parse_sie_date, SieAccount, SieData, SieVerification, SieVerificationLine};
pub use writer::emit;
