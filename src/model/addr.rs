use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A linear address in the program being decompiled.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    /// The bad address. Tokens that do not originate from any instruction
    /// carry this, and lookups on an empty listing return it.
    pub const NULL: Self = Address(u64::MAX);
    pub const ZERO: Self = Address(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn checked_add(self, rhs: u64) -> Option<Self> {
        self.0.checked_add(rhs).map(Address)
    }

    /// Parses a string of the form "\[0x\]1234" into an address. The
    /// 0x prefix forces hexadecimal, otherwise `assume_hex` picks the
    /// radix.
    pub fn parse(string: &str, assume_hex: bool) -> Result<Self, AddressParseError> {
        let string = string.trim();

        if string.is_empty() {
            return Err(AddressParseError::EmptyString);
        }

        let (digits, radix) = match string.strip_prefix("0x").or_else(|| string.strip_prefix("0X")) {
            Some(stripped) => (stripped, 16),
            None => (string, if assume_hex { 16 } else { 10 }),
        };

        u64::from_str_radix(digits, radix).map(Address).map_err(AddressParseError::Malformed)
    }
}

/// Half-open address range, `[begin, end)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Extent {
    pub begin: Address,
    pub end: Address,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AddressParseError {
    EmptyString,
    Malformed(std::num::ParseIntError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExtentParseError {
    MissingBegin,
    MissingEnd,
    MalformedBegin(AddressParseError),
    MalformedEnd(AddressParseError),
    Inverted,
    Overflow,
}

impl Extent {
    pub fn between<In: Into<Address>>(begin: In, end: In) -> Self {
        let begin = begin.into();
        let end = end.into();
        assert!(begin <= end);
        Self { begin, end }
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.begin <= addr && addr < self.end
    }

    /// Parses an extent of the form "\<begin\>:(\<end\>|+\<size\>)",
    /// such as "0x100:+0x10" or "0x100:110". In the "begin:end" form,
    /// a 0x prefix applies to both the beginning and the end.
    pub fn parse(mut string: &str, mut assume_hex: bool) -> Result<Self, ExtentParseError> {
        if let Some(s) = string.strip_prefix("0x") {
            assume_hex = true;
            string = s;
        }

        let mut i = string.splitn(2, ':');

        let begin = i.next().filter(|b| !b.is_empty()).ok_or(ExtentParseError::MissingBegin)
            .and_then(|b| Address::parse(b, assume_hex).map_err(ExtentParseError::MalformedBegin))?;
        let end = i.next().ok_or(ExtentParseError::MissingEnd)?;

        let end = match end.strip_prefix("+") {
            Some(stripped) => {
                let size = Address::parse(stripped, false).map_err(ExtentParseError::MalformedEnd)?;
                begin.checked_add(size.0).ok_or(ExtentParseError::Overflow)?
            },
            None => Address::parse(end, assume_hex).map_err(ExtentParseError::MalformedEnd)?,
        };

        if end < begin {
            return Err(ExtentParseError::Inverted);
        }

        Ok(Self { begin, end })
    }
}

/* address traits */

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "BADADDR")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "addr(null)")
        } else {
            write!(f, "addr({:#x})", self.0)
        }
    }
}

/* extent traits */

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{},{})", self.begin, self.end)
    }
}

impl std::fmt::Debug for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "extent({:?} to {:?})", self.begin, self.end)
    }
}
