//! Wire encoding for channel messages.
//!
//! bincode keeps the loopback path cheap while staying round-trippable for
//! any transport that carries opaque byte payloads.

use bytes::Bytes;
use contracts::{ChannelMessage, EnvError};

/// Encode a message for the wire.
///
/// # Errors
/// Codec error with channel context.
pub fn encode_message(channel: &str, message: &ChannelMessage) -> Result<Bytes, EnvError> {
    bincode::serialize(message)
        .map(Bytes::from)
        .map_err(|e| EnvError::Codec {
            channel: channel.to_string(),
            message: e.to_string(),
        })
}

/// Decode a message from the wire.
///
/// # Errors
/// Codec error with channel context.
pub fn decode_message(channel: &str, bytes: &Bytes) -> Result<ChannelMessage, EnvError> {
    bincode::deserialize(bytes).map_err(|e| EnvError::Codec {
        channel: channel.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        InertialData, MessageHeader, MessagePayload, SensorPayload, SensorSample, Vector3,
    };

    #[test]
    fn message_round_trips() {
        let message = ChannelMessage {
            header: MessageHeader {
                sim_time: 0.25,
                seq: 5,
                frame_id: "imu".into(),
            },
            payload: MessagePayload::Sensor(SensorSample {
                timestamp: 0.25,
                valid: true,
                payload: SensorPayload::Inertial(InertialData {
                    lin_accel: Vector3::new(0.1, -0.2, 9.8),
                    ang_vel: Vector3::new(0.0, 0.0, 0.2),
                    integration_steps: 5,
                }),
            }),
        };

        let wire = encode_message("/imu/data", &message).unwrap();
        let decoded = decode_message("/imu/data", &wire).unwrap();
        assert_eq!(decoded, message);
    }
}
