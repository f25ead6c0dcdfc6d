//! Protocol error definitions.

use odra::prelude::*;

/// Result type for the pure accounting logic.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Bonding / Earn protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtocolError {
    // Position errors (1xx)
    InsufficientCollateral = 100,
    ExceedsLoanToValue = 101,
    OverRepay = 102,
    ExceedsDebt = 103,
    HealthyPosition = 104,
    SlippageExceeded = 105,
    ZeroAmount = 106,

    // Oracle errors (2xx)
    PriceUnavailable = 200,
    PriceLengthMismatch = 201,

    // Access control errors (4xx)
    Unauthorized = 400,

    // Token errors (5xx)
    InsufficientTokenBalance = 500,
    InsufficientAllowance = 501,

    // Vault errors (6xx)
    InsufficientShares = 600,
    ZeroShares = 601,

    // Configuration / arithmetic errors (9xx)
    InvalidConfig = 900,
    MathOverflow = 901,
}

impl ProtocolError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Position
            ProtocolError::InsufficientCollateral => "Insufficient collateral",
            ProtocolError::ExceedsLoanToValue => "Debt would exceed maximum loan-to-value",
            ProtocolError::OverRepay => "Repay amount exceeds amount owed",
            ProtocolError::ExceedsDebt => "Liquidation amount exceeds outstanding debt",
            ProtocolError::HealthyPosition => "Position is not under-collateralized",
            ProtocolError::SlippageExceeded => "Output below requested minimum",
            ProtocolError::ZeroAmount => "Amount must be greater than zero",

            // Oracle
            ProtocolError::PriceUnavailable => "Oracle price unavailable",
            ProtocolError::PriceLengthMismatch => "Oracle assets and prices length mismatch",

            // Access control
            ProtocolError::Unauthorized => "Unauthorized caller",

            // Token
            ProtocolError::InsufficientTokenBalance => "Insufficient token balance",
            ProtocolError::InsufficientAllowance => "Insufficient token allowance",

            // Vault
            ProtocolError::InsufficientShares => "Insufficient shares",
            ProtocolError::ZeroShares => "Deposit too small to mint shares",

            // Config / math
            ProtocolError::InvalidConfig => "Invalid configuration parameter",
            ProtocolError::MathOverflow => "Arithmetic overflow",
        }
    }
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ProtocolError> for OdraError {
    fn from(error: ProtocolError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
