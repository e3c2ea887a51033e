use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Envelope, MAX_MESSAGE_SIZE};

/// Codec for encoding/decoding COS envelopes.
pub struct CosCodec;

impl CosCodec {
    /// Encode an envelope with framing: [4 bytes len][1 byte tag][payload]
    pub fn encode(envelope: &Envelope) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(envelope)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(4 + 1 + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(envelope.message.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a framed envelope. Returns (envelope, bytes_consumed).
    pub fn decode(data: &[u8]) -> ProtocolResult<(Envelope, usize)> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[0..4]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge { size: len - 1, max: MAX_MESSAGE_SIZE });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}", data.len(), total
            )));
        }
        let envelope: Envelope = bincode::deserialize(&data[5..total])
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        if envelope.message.type_tag() != data[4] {
            return Err(ProtocolError::FramingError(format!(
                "type tag {} does not match {} payload",
                data[4],
                envelope.message.type_name()
            )));
        }
        Ok((envelope, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::*;
    use cos_types::{ContentHash, PermissionDecision};

    fn hash() -> ContentHash {
        ContentHash::new("SHA-256", "deadbeef")
    }

    fn all_messages() -> Vec<CosMessage> {
        vec![
            CosMessage::RequestFileHandles { hashes: vec![hash()], create: true },
            CosMessage::FileHandles { success: vec![hash()], hashes: vec![hash()] },
            CosMessage::GetFileData { hash: hash() },
            CosMessage::FileData { bytes: vec![1, 2, 3, 4, 5] },
            CosMessage::StoreFileData { hash: hash(), bytes: vec![9; 32] },
            CosMessage::StoreAck { hash: hash(), size: 32 },
            CosMessage::GetPermission { host: "example.com".into() },
            CosMessage::StorePermission {
                host: "example.com".into(),
                permission: PermissionDecision::NeverAllow,
            },
            CosMessage::Permission { host: "example.com".into(), permission: None },
            CosMessage::Error {
                action: Action::GetFileData,
                code: codes::NOT_FOUND,
                message: "not found".into(),
            },
        ]
    }

    #[test]
    fn every_message_survives_framing() {
        for (i, message) in all_messages().into_iter().enumerate() {
            let envelope = Envelope::new(i as u64 + 1, "example.com", message);
            let encoded = CosCodec::encode(&envelope).unwrap();
            let (decoded, consumed) = CosCodec::decode(&encoded).unwrap();
            assert_eq!(consumed, encoded.len());
            assert_eq!(decoded, envelope);
        }
    }

    #[test]
    fn decode_consumes_one_frame_of_many() {
        let a = CosCodec::encode(&Envelope::new(1, "a", all_messages().remove(0))).unwrap();
        let b = CosCodec::encode(&Envelope::new(2, "b", all_messages().remove(2))).unwrap();
        let mut stream = a.clone();
        stream.extend_from_slice(&b);
        let (first, consumed) = CosCodec::decode(&stream).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(consumed, a.len());
        let (second, _) = CosCodec::decode(&stream[consumed..]).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn type_tags_unique() {
        let mut tags: Vec<u8> = all_messages().iter().map(|m| m.type_tag()).collect();
        let len = tags.len();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), len, "type tags should be unique");
    }

    #[test]
    fn decode_truncated() {
        let err = CosCodec::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));

        let full = CosCodec::encode(&Envelope::new(1, "a", all_messages().remove(3))).unwrap();
        let err = CosCodec::decode(&full[..full.len() - 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_zero_length() {
        let data = [0u8, 0, 0, 0, 0]; // length = 0
        let err = CosCodec::decode(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_rejects_oversized_header() {
        let mut data = ((MAX_MESSAGE_SIZE + 2) as u32).to_be_bytes().to_vec();
        data.push(1);
        let err = CosCodec::decode(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
    }

    #[test]
    fn decode_rejects_tag_mismatch() {
        let mut frame = CosCodec::encode(&Envelope::new(1, "a", all_messages().remove(2))).unwrap();
        frame[4] = 1;
        let err = CosCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn wire_action_names() {
        assert_eq!(Action::RequestFileHandles.as_str(), "requestFileHandles");
        assert_eq!(Action::GetFileData.as_str(), "getFileData");
        assert_eq!(Action::StoreFileData.as_str(), "storeFileData");
        assert_eq!(Action::GetPermission.as_str(), "getPermission");
        assert_eq!(Action::StorePermission.as_str(), "storePermission");
    }

    #[test]
    fn responses_answer_their_action_only() {
        let handles = CosMessage::FileHandles { success: vec![], hashes: vec![] };
        assert!(handles.answers(Action::RequestFileHandles));
        assert!(!handles.answers(Action::GetFileData));

        let permission = CosMessage::Permission { host: "h".into(), permission: None };
        assert!(permission.answers(Action::GetPermission));
        assert!(permission.answers(Action::StorePermission));

        let error = CosMessage::Error { action: Action::StoreFileData, code: 500, message: String::new() };
        assert!(error.answers(Action::StoreFileData));
        assert!(!error.answers(Action::GetFileData));

        // Requests never answer anything.
        assert!(!CosMessage::GetFileData { hash: hash() }.answers(Action::GetFileData));
    }

    #[test]
    fn reply_echoes_id() {
        let request = Envelope::new(42, "example.com", CosMessage::GetFileData { hash: hash() });
        let reply = request.reply(CosMessage::FileData { bytes: vec![] });
        assert_eq!(reply.id, 42);
        assert_eq!(reply.origin, "example.com");
        assert!(request.message.is_request());
        assert!(!reply.message.is_request());
    }
}
