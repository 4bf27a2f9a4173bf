pub mod employer;
pub mod error;
pub mod ink2;
pub mod vat;

pub use employer::EmployerReport;
pub use error::ReportError;
pub use ink2::{Group, GroupNet, Ink2Report};
pub use vat::VatReport;
