//! Namespace pricing and lifetime parameters
//!
//! A namespace reveal publishes how names in the namespace are priced and
//! how long they live. Each parameter has its own setter that range-checks
//! the value before it is stored, and `check()` runs every check again
//! before the descriptor is packed into a reveal payload.
//!
//! ```text
//! 3      7     8    9                17        18       20
//! |------|-----|----|----------------|---------|--------|--------------|
//!  life   coeff base bucket exponents nonalpha  version  namespace id
//!                    (16 nibbles)     novowel
//! ```

use bns_common::error::{BnsError, BnsResult};
use bns_common::validation::validate_namespace_id;
use serde::{Deserialize, Serialize};

/// Number of length buckets in the price function
pub const BUCKET_COUNT: usize = 16;

/// Largest value of a 4-bit field
const NIBBLE_MAX: u64 = 15;

/// Length of the fields that precede the namespace id
pub const FIXED_FIELDS_LENGTH: usize = 4 + 1 + 1 + 8 + 1 + 2;

/// Parameters of a namespace reveal
///
/// A fresh descriptor has zeroed parameters; its discounts are out of range
/// until they are set, so `check()` fails until it has been configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDescriptor {
    namespace_id: String,
    version: u16,
    lifetime: u32,
    coeff: u8,
    base: u8,
    buckets: [u8; BUCKET_COUNT],
    nonalpha_discount: u8,
    no_vowel_discount: u8,
}

fn out_of_range(field: &str, value: u64, min: u64, max: u64) -> BnsError {
    BnsError::validation(format!(
        "Invalid {}: {} is outside {}..={}",
        field, value, min, max
    ))
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> BnsResult<()> {
    if value < min || value > max {
        return Err(out_of_range(field, value, min, max));
    }
    Ok(())
}

impl NamespaceDescriptor {
    /// Create a descriptor for `namespace_id`
    pub fn new(namespace_id: &str) -> BnsResult<Self> {
        validate_namespace_id(namespace_id)?;

        Ok(NamespaceDescriptor {
            namespace_id: namespace_id.to_string(),
            version: 0,
            lifetime: 0,
            coeff: 0,
            base: 0,
            buckets: [0; BUCKET_COUNT],
            nonalpha_discount: 0,
            no_vowel_discount: 0,
        })
    }

    pub fn set_version(&mut self, version: u64) -> BnsResult<&mut Self> {
        check_range("version", version, 0, u16::MAX as u64)?;
        self.version = version as u16;
        Ok(self)
    }

    /// Name lifetime in blocks
    pub fn set_lifetime(&mut self, lifetime: u64) -> BnsResult<&mut Self> {
        check_range("lifetime", lifetime, 0, u32::MAX as u64)?;
        self.lifetime = lifetime as u32;
        Ok(self)
    }

    pub fn set_coeff(&mut self, coeff: u64) -> BnsResult<&mut Self> {
        check_range("coefficient", coeff, 0, u8::MAX as u64)?;
        self.coeff = coeff as u8;
        Ok(self)
    }

    pub fn set_base(&mut self, base: u64) -> BnsResult<&mut Self> {
        check_range("base", base, 0, u8::MAX as u64)?;
        self.base = base as u8;
        Ok(self)
    }

    /// Price exponent for each name length; exactly 16 values of 0..=15
    pub fn set_buckets(&mut self, buckets: &[u64]) -> BnsResult<&mut Self> {
        if buckets.len() != BUCKET_COUNT {
            return Err(BnsError::validation(format!(
                "Invalid buckets: expected {} exponents, got {}",
                BUCKET_COUNT,
                buckets.len()
            )));
        }

        let mut packed = [0u8; BUCKET_COUNT];
        for (slot, bucket) in packed.iter_mut().zip(buckets) {
            check_range("bucket exponent", *bucket, 0, NIBBLE_MAX)?;
            *slot = *bucket as u8;
        }

        self.buckets = packed;
        Ok(self)
    }

    pub fn set_nonalpha_discount(&mut self, discount: u64) -> BnsResult<&mut Self> {
        check_range("non-alpha discount", discount, 1, NIBBLE_MAX)?;
        self.nonalpha_discount = discount as u8;
        Ok(self)
    }

    pub fn set_no_vowel_discount(&mut self, discount: u64) -> BnsResult<&mut Self> {
        check_range("no-vowel discount", discount, 1, NIBBLE_MAX)?;
        self.no_vowel_discount = discount as u8;
        Ok(self)
    }

    /// Run every setter's range check on the stored values
    pub fn check(&self) -> BnsResult<()> {
        validate_namespace_id(&self.namespace_id)?;

        let mut copy = self.clone();
        copy.set_version(self.version as u64)?
            .set_lifetime(self.lifetime as u64)?
            .set_coeff(self.coeff as u64)?
            .set_base(self.base as u64)?
            .set_buckets(&self.buckets.map(u64::from))?
            .set_nonalpha_discount(self.nonalpha_discount as u64)?
            .set_no_vowel_discount(self.no_vowel_discount as u64)?;

        Ok(())
    }

    pub fn namespace_id(&self) -> &str {
        &self.namespace_id
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn coeff(&self) -> u8 {
        self.coeff
    }

    pub fn base(&self) -> u8 {
        self.base
    }

    pub fn buckets(&self) -> &[u8; BUCKET_COUNT] {
        &self.buckets
    }

    pub fn nonalpha_discount(&self) -> u8 {
        self.nonalpha_discount
    }

    pub fn no_vowel_discount(&self) -> u8 {
        self.no_vowel_discount
    }

    /// Reveal fields that follow the opcode
    pub fn to_payload(&self) -> BnsResult<Vec<u8>> {
        self.check()?;

        let mut out = Vec::with_capacity(FIXED_FIELDS_LENGTH + self.namespace_id.len());
        out.extend_from_slice(&self.lifetime.to_be_bytes());
        out.push(self.coeff);
        out.push(self.base);
        out.extend(self.buckets.chunks(2).map(|pair| (pair[0] << 4) | pair[1]));
        out.push((self.nonalpha_discount << 4) | self.no_vowel_discount);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(self.namespace_id.as_bytes());

        Ok(out)
    }
}
