use thiserror::Error;

/// Error types for the compute engines.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A recurrence or installment frequency string that is not recognized
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Installment count outside the allowed range
    #[error("Installment count must be between {min} and {max}, got {got}")]
    InvalidInstallmentCount { got: i32, min: i32, max: i32 },

    /// Attempt to settle a debt that is already paid
    #[error("Debt is already settled")]
    AlreadySettled,

    /// Attempt to pay an installment that is already paid
    #[error("Installment is already paid")]
    AlreadyPaid,

    /// An installment operation on a transaction that has no plan
    #[error("Transaction is not an installment plan")]
    NotInstallmentPlan,

    /// A partial payment against a plan with nothing left to pay
    #[error("No pending installments left on this plan")]
    NoPendingInstallments,

    /// A monetary amount that must be positive but is not
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Error from date arithmetic
    #[error("Date error: {0}")]
    Date(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
