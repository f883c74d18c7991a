//! The closed set of Sentinel message payloads.
//!
//! Every transaction carries exactly one of these records, selected by a
//! [`MessageKind`]. Each record knows how to check its own required fields
//! and produce its canonical form (trimmed strings, normalized IP).

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::address::{Address, PublicKeyBundle};
use crate::amount::Amount;
use crate::error::SentinelError;

/// Discriminant of a Sentinel message. Codes are stable and follow
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    RegisterVpn,
    DeleteVpnUser,
    RegisterMasterNode,
    DeleteMasterNode,
    PayVpnService,
    GetVpnPayment,
    Refund,
    SignToVpn,
}

impl MessageKind {
    pub const ALL: [MessageKind; 8] = [
        MessageKind::RegisterVpn,
        MessageKind::DeleteVpnUser,
        MessageKind::RegisterMasterNode,
        MessageKind::DeleteMasterNode,
        MessageKind::PayVpnService,
        MessageKind::GetVpnPayment,
        MessageKind::Refund,
        MessageKind::SignToVpn,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Maps a numeric code back to a kind. Out-of-range codes are a
    /// validation error, never a silent default.
    pub fn from_code(code: u32) -> Result<Self, SentinelError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| SentinelError::validation(format!("unknown message kind code {code}")))
    }

    /// Kinds whose payload carries coins to move.
    pub fn moves_funds(self) -> bool {
        matches!(
            self,
            MessageKind::PayVpnService | MessageKind::GetVpnPayment | MessageKind::SignToVpn
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterVpn {
    pub ip: String,
    /// Advertised upload speed in bytes per second.
    pub upload_speed: u64,
    pub price_per_gb: Amount,
    pub encryption_method: String,
    pub latitude: String,
    pub longitude: String,
    pub city: String,
    pub country: String,
    pub node_type: String,
    pub version: String,
    pub local_account: String,
    pub password: String,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteVpnUser {
    pub address: Address,
    pub name: String,
    pub password: String,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMasterNode {
    pub name: String,
    pub gas: u64,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMasterNode {
    pub address: Address,
    pub name: String,
    pub password: String,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayVpnService {
    pub coins: Amount,
    pub vpn_addr: Address,
    pub local_account: String,
    pub password: String,
    pub gas: u64,
    pub sig_name: String,
    pub sig_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetVpnPayment {
    pub coins: Amount,
    pub session_id: String,
    pub counter: u64,
    pub local_account: String,
    pub gas: u64,
    pub is_final: bool,
    pub password: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub name: String,
    pub password: String,
    pub session_id: String,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignToVpn {
    pub coins: Amount,
    pub address: Address,
    pub session_id: String,
    pub from: Address,
}

/// Tagged union of all payload records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageParams {
    RegisterVpn(RegisterVpn),
    DeleteVpnUser(DeleteVpnUser),
    RegisterMasterNode(RegisterMasterNode),
    DeleteMasterNode(DeleteMasterNode),
    PayVpnService(PayVpnService),
    GetVpnPayment(GetVpnPayment),
    Refund(Refund),
    SignToVpn(SignToVpn),
}

impl MessageParams {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageParams::RegisterVpn(_) => MessageKind::RegisterVpn,
            MessageParams::DeleteVpnUser(_) => MessageKind::DeleteVpnUser,
            MessageParams::RegisterMasterNode(_) => MessageKind::RegisterMasterNode,
            MessageParams::DeleteMasterNode(_) => MessageKind::DeleteMasterNode,
            MessageParams::PayVpnService(_) => MessageKind::PayVpnService,
            MessageParams::GetVpnPayment(_) => MessageKind::GetVpnPayment,
            MessageParams::Refund(_) => MessageKind::Refund,
            MessageParams::SignToVpn(_) => MessageKind::SignToVpn,
        }
    }

    /// Decodes an untyped record as the payload of `kind`.
    ///
    /// A missing or ill-typed field is a validation error naming the kind.
    pub fn from_json(kind: MessageKind, value: serde_json::Value) -> Result<Self, SentinelError> {
        fn decode<T: serde::de::DeserializeOwned>(
            kind: MessageKind,
            value: serde_json::Value,
        ) -> Result<T, SentinelError> {
            serde_json::from_value(value)
                .map_err(|e| SentinelError::validation(format!("{kind:?}: {e}")))
        }

        Ok(match kind {
            MessageKind::RegisterVpn => MessageParams::RegisterVpn(decode(kind, value)?),
            MessageKind::DeleteVpnUser => MessageParams::DeleteVpnUser(decode(kind, value)?),
            MessageKind::RegisterMasterNode => {
                MessageParams::RegisterMasterNode(decode(kind, value)?)
            }
            MessageKind::DeleteMasterNode => MessageParams::DeleteMasterNode(decode(kind, value)?),
            MessageKind::PayVpnService => MessageParams::PayVpnService(decode(kind, value)?),
            MessageKind::GetVpnPayment => MessageParams::GetVpnPayment(decode(kind, value)?),
            MessageKind::Refund => MessageParams::Refund(decode(kind, value)?),
            MessageKind::SignToVpn => MessageParams::SignToVpn(decode(kind, value)?),
        })
    }

    /// Validates every required field and returns the canonical payload.
    pub fn into_canonical(self) -> Result<Self, SentinelError> {
        Ok(match self {
            MessageParams::RegisterVpn(m) => MessageParams::RegisterVpn(m.into_canonical()?),
            MessageParams::DeleteVpnUser(m) => MessageParams::DeleteVpnUser(DeleteVpnUser {
                address: m.address,
                name: required("name", m.name)?,
                password: required("password", m.password)?,
                gas: m.gas,
            }),
            MessageParams::RegisterMasterNode(m) => {
                MessageParams::RegisterMasterNode(RegisterMasterNode {
                    name: required("name", m.name)?,
                    gas: m.gas,
                    password: required("password", m.password)?,
                })
            }
            MessageParams::DeleteMasterNode(m) => {
                MessageParams::DeleteMasterNode(DeleteMasterNode {
                    address: m.address,
                    name: required("name", m.name)?,
                    password: required("password", m.password)?,
                    gas: m.gas,
                })
            }
            MessageParams::PayVpnService(m) => {
                m.coins.validate_positive()?;
                MessageParams::PayVpnService(PayVpnService {
                    coins: m.coins,
                    vpn_addr: m.vpn_addr,
                    local_account: required("local_account", m.local_account)?,
                    password: required("password", m.password)?,
                    gas: m.gas,
                    sig_name: required("sig_name", m.sig_name)?,
                    sig_password: required("sig_password", m.sig_password)?,
                })
            }
            MessageParams::GetVpnPayment(m) => {
                m.coins.validate_positive()?;
                MessageParams::GetVpnPayment(GetVpnPayment {
                    coins: m.coins,
                    session_id: required("session_id", m.session_id)?,
                    counter: m.counter,
                    local_account: required("local_account", m.local_account)?,
                    gas: m.gas,
                    is_final: m.is_final,
                    password: required("password", m.password)?,
                    signature: required("signature", m.signature)?,
                })
            }
            MessageParams::Refund(m) => MessageParams::Refund(Refund {
                name: required("name", m.name)?,
                password: required("password", m.password)?,
                session_id: required("session_id", m.session_id)?,
                gas: m.gas,
            }),
            MessageParams::SignToVpn(m) => {
                m.coins.validate_positive()?;
                MessageParams::SignToVpn(SignToVpn {
                    coins: m.coins,
                    address: m.address,
                    session_id: required("session_id", m.session_id)?,
                    from: m.from,
                })
            }
        })
    }

    /// Coins moved by this payload, if any.
    pub fn coins(&self) -> Option<&Amount> {
        match self {
            MessageParams::PayVpnService(m) => Some(&m.coins),
            MessageParams::GetVpnPayment(m) => Some(&m.coins),
            MessageParams::SignToVpn(m) => Some(&m.coins),
            _ => None,
        }
    }

    /// The account that receives this payload's coins, if the payload names one.
    pub fn payee(&self) -> Option<Address> {
        match self {
            MessageParams::PayVpnService(m) => Some(m.vpn_addr),
            MessageParams::SignToVpn(m) => Some(m.address),
            _ => None,
        }
    }
}

impl RegisterVpn {
    fn into_canonical(self) -> Result<Self, SentinelError> {
        let ip: IpAddr = self
            .ip
            .trim()
            .parse()
            .map_err(|_| SentinelError::validation(format!("ip {:?} is not an IP address", self.ip)))?;
        self.price_per_gb.validate()?;

        Ok(RegisterVpn {
            ip: ip.to_string(),
            upload_speed: self.upload_speed,
            price_per_gb: self.price_per_gb,
            encryption_method: required("encryption_method", self.encryption_method)?,
            latitude: coordinate("latitude", self.latitude, 90.0)?,
            longitude: coordinate("longitude", self.longitude, 180.0)?,
            city: required("city", self.city)?,
            country: required("country", self.country)?,
            node_type: required("node_type", self.node_type)?,
            version: required("version", self.version)?,
            local_account: required("local_account", self.local_account)?,
            password: required("password", self.password)?,
            gas: self.gas,
        })
    }
}

/// Trims a required string field, rejecting it when nothing is left.
fn required(field: &str, value: String) -> Result<String, SentinelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SentinelError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

fn coordinate(field: &str, value: String, limit: f64) -> Result<String, SentinelError> {
    let value = required(field, value)?;
    let parsed: f64 = value
        .parse()
        .map_err(|_| SentinelError::validation(format!("{field} {value:?} is not a number")))?;
    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(SentinelError::validation(format!(
            "{field} {value} is outside [-{limit}, {limit}]"
        )));
    }
    Ok(value)
}

/// A client's open bandwidth session with a VPN node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentSession {
    pub locked_coins: Amount,
    pub released_coins: Amount,
    pub counter: u64,
    pub timestamp: String,
    pub vpn_pub_key: PublicKeyBundle,
    pub client_pub_key: PublicKeyBundle,
    pub client_address: Address,
    pub active: bool,
}

impl SentSession {
    /// Session id as the chain computes it: decimal counter followed by the
    /// client address.
    pub fn session_id(&self) -> String {
        format!("{}{}", self.counter, self.client_address)
    }
}
