//! Strkey decoding and `type:value` invocation arguments.

use ed25519_dalek::SigningKey;
use stellar_strkey::Strkey;
use stellar_xdr::curr::{
    AccountId, ContractId, Hash, Int128Parts, PublicKey, ScAddress, ScBytes, ScString, ScSymbol,
    ScVal, StringM, UInt128Parts, Uint256,
};

use crate::error::RpcError;

/// Decode the source account. A secret key is accepted and only its public
/// half is kept; nothing here signs.
pub fn decode_source_account(source: &str) -> Result<AccountId, RpcError> {
    let strkey = Strkey::from_string(source).map_err(|e| RpcError::InvalidAddress {
        address: redact(source),
        reason: format!("{}", e),
    })?;

    match strkey {
        Strkey::PublicKeyEd25519(pk) => Ok(account_id(pk.0)),
        Strkey::PrivateKeyEd25519(sk) => {
            let public = SigningKey::from_bytes(&sk.0).verifying_key();
            Ok(account_id(public.to_bytes()))
        }
        _ => Err(RpcError::InvalidAddress {
            address: redact(source),
            reason: "source must be a G... address or S... secret key".to_string(),
        }),
    }
}

/// Decode a `C...` contract address.
pub fn decode_contract_address(contract: &str) -> Result<ScAddress, RpcError> {
    match decode_address(contract)? {
        address @ ScAddress::Contract(_) => Ok(address),
        _ => Err(RpcError::InvalidAddress {
            address: contract.to_string(),
            reason: "expected C... contract address".to_string(),
        }),
    }
}

/// Decode a `G...` account or `C...` contract address.
pub fn decode_address(addr: &str) -> Result<ScAddress, RpcError> {
    let strkey = Strkey::from_string(addr).map_err(|e| RpcError::InvalidAddress {
        address: addr.to_string(),
        reason: format!("{}", e),
    })?;

    match strkey {
        Strkey::PublicKeyEd25519(pk) => Ok(ScAddress::Account(account_id(pk.0))),
        Strkey::Contract(c) => Ok(ScAddress::Contract(ContractId(Hash(c.0)))),
        _ => Err(RpcError::InvalidAddress {
            address: addr.to_string(),
            reason: "expected G... (account) or C... (contract) address".to_string(),
        }),
    }
}

/// The G... form of an account.
pub fn account_strkey(account: &AccountId) -> String {
    let PublicKey::PublicKeyTypeEd25519(Uint256(bytes)) = &account.0;
    Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(*bytes)).to_string()
}

fn account_id(bytes: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes)))
}

fn redact(key: &str) -> String {
    if key.starts_with('S') && key.len() > 8 {
        format!("{}...", key.get(..4).unwrap_or("S"))
    } else {
        key.to_string()
    }
}

/// Parse one invocation argument written as `type:value`.
///
/// Supported types: `bool`, `u32`, `i32`, `u64`, `i64`, `u128`, `i128`,
/// `symbol`, `string`, `bytes` (hex), `address`.
pub fn parse_arg(arg: &str) -> Result<ScVal, RpcError> {
    let invalid = |reason: String| RpcError::InvalidArgument {
        arg: arg.to_string(),
        reason,
    };
    let (kind, value) = arg
        .split_once(':')
        .ok_or_else(|| invalid("expected type:value".to_string()))?;

    match kind {
        "bool" => match value {
            "true" => Ok(ScVal::Bool(true)),
            "false" => Ok(ScVal::Bool(false)),
            _ => Err(invalid("expected true or false".to_string())),
        },
        "u32" => value
            .parse()
            .map(ScVal::U32)
            .map_err(|e| invalid(format!("{}", e))),
        "i32" => value
            .parse()
            .map(ScVal::I32)
            .map_err(|e| invalid(format!("{}", e))),
        "u64" => value
            .parse()
            .map(ScVal::U64)
            .map_err(|e| invalid(format!("{}", e))),
        "i64" => value
            .parse()
            .map(ScVal::I64)
            .map_err(|e| invalid(format!("{}", e))),
        "u128" => {
            let v: u128 = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            Ok(ScVal::U128(UInt128Parts {
                hi: (v >> 64) as u64,
                lo: v as u64,
            }))
        }
        "i128" => {
            let v: i128 = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            Ok(ScVal::I128(Int128Parts {
                hi: (v >> 64) as i64,
                lo: v as u64,
            }))
        }
        "symbol" => {
            let sym: ScSymbol = value
                .to_string()
                .try_into()
                .map_err(|_| invalid("symbol too long".to_string()))?;
            Ok(ScVal::Symbol(sym))
        }
        "string" => {
            let s: StringM = value
                .to_string()
                .try_into()
                .map_err(|_| invalid("string too long".to_string()))?;
            Ok(ScVal::String(ScString(s)))
        }
        "bytes" => {
            let bytes = decode_hex(value).map_err(invalid)?;
            let sc: ScBytes = bytes
                .try_into()
                .map_err(|_| invalid("bytes too long".to_string()))?;
            Ok(ScVal::Bytes(sc))
        }
        "address" => Ok(ScVal::Address(decode_address(value)?)),
        other => Err(invalid(format!("unknown type '{}'", other))),
    }
}

fn decode_hex(hex_str: &str) -> Result<Vec<u8>, String> {
    let hex = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if hex.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex at offset {}", i))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";
    const CONTRACT: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4";
    // secret key with every byte set to 1
    const SECRET: &str = "SAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQC5MY";

    #[test]
    fn source_from_public_key() {
        let account = decode_source_account(ACCOUNT).unwrap();
        assert_eq!(account, account_id([0u8; 32]));
        assert_eq!(account_strkey(&account), ACCOUNT);
    }

    #[test]
    fn source_from_secret_key() {
        let account = decode_source_account(SECRET).unwrap();
        let expected = SigningKey::from_bytes(&[1u8; 32]).verifying_key().to_bytes();
        assert_eq!(account, account_id(expected));
    }

    #[test]
    fn source_rejects_contract() {
        let err = decode_source_account(CONTRACT).unwrap_err();
        assert!(matches!(err, RpcError::InvalidAddress { .. }), "got {:?}", err);
    }

    #[test]
    fn bad_secret_is_not_echoed() {
        let bad = "SBADSECRETKEYTHATDOESNOTDECODEATALL";
        let err = decode_source_account(bad).unwrap_err();
        assert!(!err.to_string().contains(bad), "msg: {}", err);
    }

    #[test]
    fn contract_address() {
        let addr = decode_contract_address(CONTRACT).unwrap();
        assert_eq!(addr, ScAddress::Contract(ContractId(Hash([0u8; 32]))));
        assert!(decode_contract_address(ACCOUNT).is_err());
    }

    #[test]
    fn parse_scalar_args() {
        assert_eq!(parse_arg("bool:true").unwrap(), ScVal::Bool(true));
        assert_eq!(parse_arg("u32:7").unwrap(), ScVal::U32(7));
        assert_eq!(parse_arg("i32:-7").unwrap(), ScVal::I32(-7));
        assert_eq!(parse_arg("u64:18446744073709551615").unwrap(), ScVal::U64(u64::MAX));
        assert_eq!(parse_arg("i64:-1").unwrap(), ScVal::I64(-1));
    }

    #[test]
    fn parse_wide_ints() {
        assert_eq!(
            parse_arg("u128:18446744073709551616").unwrap(),
            ScVal::U128(UInt128Parts { hi: 1, lo: 0 })
        );
        assert_eq!(
            parse_arg("i128:-1").unwrap(),
            ScVal::I128(Int128Parts {
                hi: -1,
                lo: u64::MAX
            })
        );
    }

    #[test]
    fn parse_symbol_matches_demo_call() {
        match parse_arg("symbol:Dev").unwrap() {
            ScVal::Symbol(sym) => assert_eq!(sym.to_string(), "Dev"),
            other => panic!("expected Symbol, got {:?}", other),
        }
    }

    #[test]
    fn parse_string_bytes_address() {
        match parse_arg("string:hello world").unwrap() {
            ScVal::String(s) => assert_eq!(s.0.to_utf8_string_lossy(), "hello world"),
            other => panic!("expected String, got {:?}", other),
        }
        match parse_arg("bytes:0xdeadbeef").unwrap() {
            ScVal::Bytes(b) => assert_eq!(b.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]),
            other => panic!("expected Bytes, got {:?}", other),
        }
        assert!(matches!(
            parse_arg(&format!("address:{}", ACCOUNT)).unwrap(),
            ScVal::Address(ScAddress::Account(_))
        ));
    }

    #[test]
    fn parse_arg_errors() {
        for bad in ["nocolon", "u32:-1", "bool:yes", "bytes:abc", "float:1.5"] {
            let err = parse_arg(bad).unwrap_err();
            assert!(
                matches!(err, RpcError::InvalidArgument { .. }),
                "{} gave {:?}",
                bad,
                err
            );
        }
    }
}
