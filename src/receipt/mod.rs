use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::ledger::{Address, HubAction, LedgerEvent};

/// Record of one executed action, accepted or not.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub height: u64,
    pub timestamp: u64,
    pub sender: Address,
    pub action_digest: [u8; 32],
    pub outcome: ReceiptOutcome,
    pub previous: Option<[u8; 32]>,
    pub state_root: [u8; 32],
}

impl Receipt {
    pub fn digest(&self) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.sender.as_bytes());
        hasher.update(self.action_digest);
        hasher.update(self.outcome.commitment()?);
        if let Some(previous) = &self.previous {
            hasher.update(previous);
        }
        hasher.update(self.state_root);
        Ok(hasher.finalize().into())
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, ReceiptOutcome::Accepted { .. })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReceiptOutcome {
    Accepted { events: Vec<LedgerEvent> },
    Rejected { reason: String },
}

impl ReceiptOutcome {
    pub fn commitment(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            ReceiptOutcome::Accepted { events } => {
                buf.extend_from_slice(b"accepted");
                buf.extend_from_slice(&(events.len() as u64).to_le_bytes());
                for event in events {
                    buf.extend(serde_json::to_vec(event)?);
                }
            }
            ReceiptOutcome::Rejected { reason } => {
                buf.extend_from_slice(b"rejected");
                buf.extend_from_slice(reason.as_bytes());
            }
        }
        Ok(buf)
    }
}

pub fn action_digest(sender: &str, action: &HubAction, timestamp: u64) -> Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(sender.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    hasher.update(serde_json::to_vec(action)?);
    Ok(hasher.finalize().into())
}

/// Hex encoding for opaque module bytes.
pub(crate) mod serde_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let trimmed = encoded.strip_prefix("0x").unwrap_or(&encoded);
        hex::decode(trimmed).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_and_accepted_commitments_differ() {
        let accepted = ReceiptOutcome::Accepted { events: vec![] };
        let rejected = ReceiptOutcome::Rejected {
            reason: "follow invalid".into(),
        };
        assert_ne!(accepted.commitment().unwrap(), rejected.commitment().unwrap());
    }

    #[test]
    fn digest_covers_previous_receipt() {
        let receipt = Receipt {
            height: 1,
            timestamp: 10,
            sender: "alice".into(),
            action_digest: [3u8; 32],
            outcome: ReceiptOutcome::Rejected {
                reason: "follow invalid".into(),
            },
            previous: None,
            state_root: [1u8; 32],
        };
        let chained = Receipt {
            previous: Some(receipt.digest().unwrap()),
            ..receipt.clone()
        };
        assert_ne!(receipt.digest().unwrap(), chained.digest().unwrap());
        assert!(!receipt.is_accepted());
    }

    #[test]
    fn action_digest_depends_on_sender() {
        let action = HubAction::Follow { profile_ids: vec![1] };
        assert_ne!(
            action_digest("alice", &action, 1).unwrap(),
            action_digest("bob", &action, 1).unwrap()
        );
    }

    #[test]
    fn module_bytes_accept_prefixed_hex() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "super::serde_bytes")]
            data: Vec<u8>,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"data":"0xbeef"}"#).unwrap();
        assert_eq!(parsed.data, vec![0xbe, 0xef]);
    }
}
