pub mod account;
pub mod company;
pub mod money;
pub mod period;
pub mod verification;

pub use account::{
    Account, AccountClass, AccountId, AccountSeed, AccountType, ChartOfAccountsSeed, CompanyId,
};
pub use company::{AccountingStandard, Company};
pub use money::{Money, MoneyError};
pub use period::{DateRange, FiscalYear, FiscalYearId};
pub use verification::{
    UnvalidatedVerification, Verification, VerificationId, VerificationLine,
};
