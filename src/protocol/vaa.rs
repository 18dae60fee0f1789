// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Guardian-signed VAA envelope
//!
//! The core only decodes the envelope to bind the VAA to the message it was
//! requested for. Signature and quorum checks belong to the guardian network
//! and the destination contracts.
//!
//! # Format
//!
//! Header:
//! - version: uint8
//! - guardianSetIndex: uint32
//! - signatureCount: uint8
//! - signatures: signatureCount x (guardianIndex: uint8, signature: bytes65)
//!
//! Body:
//! - timestamp: uint32
//! - nonce: uint32
//! - emitterChain: uint16
//! - emitterAddress: bytes32
//! - sequence: uint64
//! - consistencyLevel: uint8
//! - payload: remaining bytes

use alloy_primitives::{keccak256, Bytes, FixedBytes, B256};

use super::{ChainId, MessageReference, UniversalAddress};
use crate::error::{BridgeError, Result};

const SIGNATURE_SIZE: usize = 66;
const BODY_FIXED_SIZE: usize = 4 + 4 + 2 + 32 + 8 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    pub guardian_index: u8,
    pub signature: FixedBytes<65>,
}

/// Token bridge payload discriminator (first payload byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Transfer,
    AttestMeta,
    TransferWithPayload,
}

impl PayloadKind {
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload.first()? {
            1 => Some(PayloadKind::Transfer),
            2 => Some(PayloadKind::AttestMeta),
            3 => Some(PayloadKind::TransferWithPayload),
            _ => None,
        }
    }

    pub const fn id(self) -> u8 {
        match self {
            PayloadKind::Transfer => 1,
            PayloadKind::AttestMeta => 2,
            PayloadKind::TransferWithPayload => 3,
        }
    }

    /// Whether a VAA carrying `actual` satisfies a wait for `self`.
    pub fn accepts(self, actual: PayloadKind) -> bool {
        match self {
            PayloadKind::Transfer => matches!(
                actual,
                PayloadKind::Transfer | PayloadKind::TransferWithPayload
            ),
            other => other == actual,
        }
    }
}

/// A signed VAA as returned by the guardian service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: ChainId,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Bytes,
}

impl Attestation {
    /// Decodes a serialized VAA.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let version = reader.u8()?;
        let guardian_set_index = reader.u32()?;
        let signature_count = reader.u8()? as usize;

        if reader.remaining() < signature_count * SIGNATURE_SIZE + BODY_FIXED_SIZE {
            return Err(BridgeError::invalid_vaa(format!(
                "{} bytes cannot hold {signature_count} signatures and a body",
                bytes.len()
            )));
        }

        let signatures = (0..signature_count)
            .map(|_| {
                Ok(GuardianSignature {
                    guardian_index: reader.u8()?,
                    signature: FixedBytes::from_slice(reader.take(65)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let timestamp = reader.u32()?;
        let nonce = reader.u32()?;
        let emitter_chain = ChainId(reader.u16()?);
        let emitter_address = UniversalAddress(FixedBytes::from_slice(reader.take(32)?));
        let sequence = reader.u64()?;
        let consistency_level = reader.u8()?;
        let payload = Bytes::copy_from_slice(reader.rest());

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
        })
    }

    /// Serializes the VAA back into its wire form.
    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(
            6 + self.signatures.len() * SIGNATURE_SIZE + BODY_FIXED_SIZE + self.payload.len(),
        );
        bytes.push(self.version);
        bytes.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        bytes.push(self.signatures.len() as u8);
        for signature in &self.signatures {
            bytes.push(signature.guardian_index);
            bytes.extend_from_slice(signature.signature.as_slice());
        }
        bytes.extend_from_slice(&self.body());
        Bytes::from(bytes)
    }

    /// The signed body (everything after the signatures).
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(BODY_FIXED_SIZE + self.payload.len());
        body.extend_from_slice(&self.timestamp.to_be_bytes());
        body.extend_from_slice(&self.nonce.to_be_bytes());
        body.extend_from_slice(&self.emitter_chain.as_u16().to_be_bytes());
        body.extend_from_slice(self.emitter_address.as_bytes());
        body.extend_from_slice(&self.sequence.to_be_bytes());
        body.push(self.consistency_level);
        body.extend_from_slice(&self.payload);
        body
    }

    /// Double keccak of the body, the digest guardians sign.
    pub fn digest(&self) -> B256 {
        keccak256(keccak256(self.body()))
    }

    pub fn reference(&self) -> MessageReference {
        MessageReference::new(self.emitter_chain, self.emitter_address, self.sequence)
    }

    pub fn payload_kind(&self) -> Option<PayloadKind> {
        PayloadKind::from_payload(&self.payload)
    }

    /// Decodes the payload as token metadata (attestation VAAs only).
    pub fn asset_meta(&self) -> Result<AssetMeta> {
        AssetMeta::decode(&self.payload)
    }
}

/// Token metadata carried by an attestation VAA.
///
/// - payloadId: uint8 (2)
/// - tokenAddress: bytes32
/// - tokenChain: uint16
/// - decimals: uint8
/// - symbol: bytes32
/// - name: bytes32
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMeta {
    pub token_address: UniversalAddress,
    pub token_chain: ChainId,
    pub decimals: u8,
    pub symbol: FixedBytes<32>,
    pub name: FixedBytes<32>,
}

impl AssetMeta {
    pub const SIZE: usize = 100;

    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::SIZE {
            return Err(BridgeError::invalid_vaa(format!(
                "asset meta payload is {} bytes, expected {}",
                payload.len(),
                Self::SIZE
            )));
        }
        let mut reader = Reader::new(payload);
        let payload_id = reader.u8()?;
        if payload_id != PayloadKind::AttestMeta.id() {
            return Err(BridgeError::invalid_vaa(format!(
                "payload id {payload_id} is not an asset attestation"
            )));
        }

        Ok(Self {
            token_address: UniversalAddress(FixedBytes::from_slice(reader.take(32)?)),
            token_chain: ChainId(reader.u16()?),
            decimals: reader.u8()?,
            symbol: FixedBytes::from_slice(reader.take(32)?),
            name: FixedBytes::from_slice(reader.take(32)?),
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.push(PayloadKind::AttestMeta.id());
        bytes.extend_from_slice(self.token_address.as_bytes());
        bytes.extend_from_slice(&self.token_chain.as_u16().to_be_bytes());
        bytes.push(self.decimals);
        bytes.extend_from_slice(self.symbol.as_slice());
        bytes.extend_from_slice(self.name.as_slice());
        Bytes::from(bytes)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(BridgeError::invalid_vaa(format!(
                "truncated at offset {}: wanted {n} bytes, {} left",
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        slice
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attestation {
        Attestation {
            version: 1,
            guardian_set_index: 4,
            signatures: vec![GuardianSignature {
                guardian_index: 0,
                signature: FixedBytes::from([0x5a; 65]),
            }],
            timestamp: 1_700_000_000,
            nonce: 7,
            emitter_chain: ChainId::SOLANA,
            emitter_address: UniversalAddress::from([0x22; 32]),
            sequence: 1234,
            consistency_level: 32,
            payload: AssetMeta {
                token_address: UniversalAddress::from([0x33; 32]),
                token_chain: ChainId::SOLANA,
                decimals: 9,
                symbol: FixedBytes::ZERO,
                name: FixedBytes::ZERO,
            }
            .encode(),
        }
    }

    #[test]
    fn test_decode_recovers_reference() {
        let vaa = sample();
        let decoded = Attestation::from_bytes(&vaa.encode()).unwrap();

        assert_eq!(decoded, vaa);
        assert_eq!(
            decoded.reference(),
            MessageReference::new(ChainId::SOLANA, UniversalAddress::from([0x22; 32]), 1234)
        );
        assert_eq!(decoded.payload_kind(), Some(PayloadKind::AttestMeta));
        assert_eq!(decoded.asset_meta().unwrap().decimals, 9);
    }

    #[test]
    fn test_truncated_vaa_rejected() {
        let bytes = sample().encode();
        let result = Attestation::from_bytes(&bytes[..40]);
        assert!(matches!(result, Err(BridgeError::InvalidVaa { .. })));

        assert!(Attestation::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_signature_count_exceeding_length_rejected() {
        let mut bytes = sample().encode().to_vec();
        bytes[5] = 200;
        assert!(matches!(
            Attestation::from_bytes(&bytes),
            Err(BridgeError::InvalidVaa { .. })
        ));
    }

    #[test]
    fn test_transfer_wait_accepts_payload_transfers() {
        assert!(PayloadKind::Transfer.accepts(PayloadKind::TransferWithPayload));
        assert!(PayloadKind::Transfer.accepts(PayloadKind::Transfer));
        assert!(!PayloadKind::Transfer.accepts(PayloadKind::AttestMeta));
        assert!(!PayloadKind::AttestMeta.accepts(PayloadKind::Transfer));
    }

    #[test]
    fn test_asset_meta_rejects_transfer_payload() {
        let mut payload = vec![1u8];
        payload.extend_from_slice(&[0u8; 99]);
        assert!(AssetMeta::decode(&payload).is_err());
    }

    #[test]
    fn test_digest_depends_on_body_only() {
        let vaa = sample();
        let mut resigned = vaa.clone();
        resigned.signatures.clear();
        resigned.guardian_set_index = 5;
        assert_eq!(vaa.digest(), resigned.digest());
    }
}
