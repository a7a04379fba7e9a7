// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Typed result mappers
//!
//! Records are deserialized from a [`StructuredPayload`] with serde. Only
//! presence and JSON type are checked; a missing field is an error, never a
//! default, and keys a record does not declare are ignored.

use serde::de::DeserializeOwned;

use crate::{
	codec::StructuredPayload,
	error::MappingError,
	record::{CertDetails, ProcessInfo, ProcessTime},
};

pub trait FromPayload: DeserializeOwned {
	const RECORD: &'static str;
	/// Wire keys the record requires
	const FIELDS: &'static [&'static str];

	fn from_payload(payload: &StructuredPayload) -> Result<Self, MappingError> {
		payload.deserialize().map_err(|err| mapping_error::<Self>(&err))
	}
}

impl FromPayload for ProcessInfo {
	const RECORD: &'static str = "ProcessInfo";
	const FIELDS: &'static [&'static str] = &["cpu_usage", "start_time", "run_time", "virtual_memory", "memory"];
}

impl FromPayload for ProcessTime {
	const RECORD: &'static str = "ProcessTime";
	const FIELDS: &'static [&'static str] = &["user_time", "system_time"];
}

impl FromPayload for CertDetails {
	const RECORD: &'static str = "CertDetails";
	const FIELDS: &'static [&'static str] = &["certificat", "public_key", "error"];
}

fn mapping_error<R: FromPayload>(err: &serde_json::Error) -> MappingError {
	let reason = err.to_string();
	let missing = reason.strip_prefix("missing field `").and_then(|rest| rest.strip_suffix('`'));

	match missing.and_then(|name| R::FIELDS.iter().copied().find(|field| *field == name)) {
		Some(field) => MappingError::MissingField {
			record: R::RECORD,
			field,
		},
		None => MappingError::InvalidField {
			record: R::RECORD,
			reason,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::decode_structured;

	fn payload(json: &str) -> StructuredPayload {
		decode_structured(json.as_bytes()).unwrap()
	}

	#[test]
	fn test_process_info() {
		let info = ProcessInfo::from_payload(&payload(
			r#"{"cpu_usage":12.5,"start_time":100,"run_time":5,"virtual_memory":2048,"memory":1024}"#,
		))
		.unwrap();

		assert_eq!(
			info,
			ProcessInfo {
				cpu_usage: 12.5,
				start_time: 100,
				run_time: 5,
				virtual_memory: 2048,
				memory: 1024,
			}
		);
	}

	#[test]
	fn test_process_info_integral_cpu_usage() {
		let info = ProcessInfo::from_payload(&payload(
			r#"{"cpu_usage":0,"start_time":0,"run_time":0,"virtual_memory":0,"memory":0}"#,
		))
		.unwrap();
		assert_eq!(info, ProcessInfo::default());
	}

	#[test]
	fn test_process_time() {
		let time = ProcessTime::from_payload(&payload(r#"{"user_time":3,"system_time":2}"#)).unwrap();
		assert_eq!(
			time,
			ProcessTime {
				user_time: 3,
				system_time: 2,
			}
		);
	}

	#[test]
	fn test_missing_field_is_an_error() {
		let err = ProcessTime::from_payload(&payload(r#"{"user_time":3}"#)).unwrap_err();
		assert_eq!(
			err,
			MappingError::MissingField {
				record: "ProcessTime",
				field: "system_time",
			}
		);
	}

	#[test]
	fn test_wrong_type_is_an_error() {
		let err = ProcessTime::from_payload(&payload(r#"{"user_time":-3,"system_time":2}"#)).unwrap_err();
		assert!(matches!(
			err,
			MappingError::InvalidField {
				record: "ProcessTime",
				..
			}
		));

		let err = CertDetails::from_payload(&payload(r#"{"certificat":1,"public_key":"","error":""}"#)).unwrap_err();
		let MappingError::InvalidField {
			record,
			reason,
		} = err
		else {
			panic!("expected an invalid field, got {err:?}");
		};
		assert_eq!(record, "CertDetails");
		assert!(reason.contains("expected a string"), "{reason}");
	}

	#[test]
	fn test_cert_details_error_is_data() {
		let details =
			CertDetails::from_payload(&payload(r#"{"certificat":"","public_key":"","error":"NO_CERT"}"#))
				.unwrap();
		assert!(details.is_err());
		assert_eq!(details.error, "NO_CERT");
		assert!(details.certificate.is_empty());
		assert!(details.public_key.is_empty());
	}

	#[test]
	fn test_cert_details_accepts_either_key() {
		let wire = CertDetails::from_payload(&payload(r#"{"certificat":"PEM","public_key":"KEY","error":""}"#))
			.unwrap();
		let plain = CertDetails::from_payload(&payload(r#"{"certificate":"PEM","public_key":"KEY","error":""}"#))
			.unwrap();
		assert_eq!(wire, plain);
		assert!(!wire.is_err());

		let err = CertDetails::from_payload(&payload(r#"{"public_key":"KEY","error":""}"#)).unwrap_err();
		assert_eq!(
			err,
			MappingError::MissingField {
				record: "CertDetails",
				field: "certificat",
			}
		);
	}

	#[test]
	fn test_unknown_keys_are_ignored() {
		let time =
			ProcessTime::from_payload(&payload(r#"{"user_time":3,"system_time":2,"children_time":9}"#)).unwrap();
		assert_eq!(time.user_time, 3);
		assert_eq!(time.system_time, 2);
	}

	#[test]
	fn test_every_missing_field_is_named() {
		for &field in ProcessInfo::FIELDS {
			let mut fields = payload(
				r#"{"cpu_usage":12.5,"start_time":100,"run_time":5,"virtual_memory":2048,"memory":1024}"#,
			)
			.into_inner();
			fields.remove(field);

			let err = ProcessInfo::from_payload(&StructuredPayload::from(fields)).unwrap_err();
			assert_eq!(
				err,
				MappingError::MissingField {
					record: "ProcessInfo",
					field,
				}
			);
		}
	}
}
