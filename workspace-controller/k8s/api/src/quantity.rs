use crate::Quantity;
use std::str::FromStr;

/// A Kubernetes resource quantity reduced to an exact count of nano-units.
///
/// Quantities compare numerically, so `800m`, `0.8` and `8e-1` are equal, as
/// are `1Gi` and `1024Mi`. Precision finer than one nano-unit is rounded up,
/// away from zero, as the API server does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedQuantity {
    nanos: i128,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("quantity must not be empty")]
    Empty,

    #[error("invalid number")]
    NotANumber,

    #[error("invalid suffix {:?}: {}", .0, EXPECTED_SUFFIXES)]
    InvalidSuffix(String),

    #[error("quantity is out of range")]
    OutOfRange,
}

const EXPECTED_SUFFIXES: &str = "expected one of 'n', 'u', 'm', 'k', 'M', 'G', 'T', 'P', 'E', \
     'Ki', 'Mi', 'Gi', 'Ti', 'Pi', 'Ei', or a decimal exponent";

// Nano-units are the smallest representable amount.
const NANO_EXPONENT: i32 = 9;

impl ParsedQuantity {
    #[inline]
    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }
}

impl TryFrom<&Quantity> for ParsedQuantity {
    type Error = ParseError;

    fn try_from(Quantity(q): &Quantity) -> Result<Self, Self::Error> {
        q.parse()
    }
}

impl FromStr for ParsedQuantity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // implements the grammar documented at
        // https://github.com/kubernetes/apimachinery/blob/master/pkg/api/resource/quantity.go
        //
        //   <quantity> ::= <signedNumber><suffix>
        //   <suffix>   ::= <binarySI> | <decimalExponent> | <decimalSI>

        fn suffix_exponents(suffix: &str) -> Result<(i32, u32), ParseError> {
            let exponents = match suffix {
                "" => (0, 0),
                "n" => (-9, 0),
                "u" => (-6, 0),
                "m" => (-3, 0),
                "k" => (3, 0),
                "M" => (6, 0),
                "G" => (9, 0),
                "T" => (12, 0),
                "P" => (15, 0),
                "E" => (18, 0),
                "Ki" => (0, 10),
                "Mi" => (0, 20),
                "Gi" => (0, 30),
                "Ti" => (0, 40),
                "Pi" => (0, 50),
                "Ei" => (0, 60),
                _ => {
                    let exp = suffix
                        .strip_prefix('e')
                        .or_else(|| suffix.strip_prefix('E'))
                        .and_then(|exp| exp.parse::<i32>().ok())
                        .ok_or_else(|| ParseError::InvalidSuffix(suffix.to_string()))?;
                    (exp, 0)
                }
            };
            Ok(exponents)
        }

        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        let (is_negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let number_len = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_len);
        let (int, frac) = number.split_once('.').unwrap_or((number, ""));
        if (int.is_empty() && frac.is_empty()) || frac.contains('.') {
            return Err(ParseError::NotANumber);
        }
        let frac = frac.trim_end_matches('0');

        let mut mantissa: i128 = 0;
        for digit in int.bytes().chain(frac.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or(ParseError::OutOfRange)?;
        }

        let (exp10, exp2) = suffix_exponents(suffix)?;
        let frac_len = i32::try_from(frac.len()).map_err(|_| ParseError::OutOfRange)?;
        let scale = exp10
            .checked_sub(frac_len)
            .and_then(|s| s.checked_add(NANO_EXPONENT))
            .ok_or(ParseError::OutOfRange)?;

        let value = mantissa
            .checked_mul(2i128.pow(exp2))
            .ok_or(ParseError::OutOfRange)?;
        let nanos = if scale >= 0 {
            10i128
                .checked_pow(scale.unsigned_abs())
                .and_then(|factor| value.checked_mul(factor))
                .ok_or(ParseError::OutOfRange)?
        } else {
            match 10i128.checked_pow(scale.unsigned_abs()) {
                Some(divisor) => value / divisor + i128::from(value % divisor != 0),
                // Anything non-zero this small rounds up to a single nano-unit.
                None => i128::from(value != 0),
            }
        };

        Ok(Self {
            nanos: if is_negative { -nanos } else { nanos },
        })
    }
}
