//! Property-based tests for request encoding and audio helpers

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use elevenlabs_transport::{ChunkStream, HttpRequest};
    use futures::StreamExt;
    use proptest::prelude::*;

    use crate::audio::{AudioFormat, detect_audio_format};
    use crate::streaming::AudioStream;
    use crate::types::{ConvertRequest, OutputFormat, VoiceSettings};

    // ===== Strategy Generators =====

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,!?']{1,200}"
    }

    fn arb_voice_id() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{20}"
    }

    fn arb_unit() -> impl Strategy<Value = Option<f64>> {
        proptest::option::of(0.0f64..=1.0)
    }

    // ===== Request Properties =====

    proptest! {
        /// The voice id and query-only fields never reach the JSON body.
        #[test]
        fn prop_body_excludes_path_and_query_fields(
            text in arb_text(),
            voice_id in arb_voice_id(),
            latency in proptest::option::of(0u8..=4),
            logging in proptest::option::of(any::<bool>()),
        ) {
            let mut builder = ConvertRequest::builder();
            builder.text(text.clone()).voice_id(voice_id.clone());
            if let Some(latency) = latency {
                builder.optimize_streaming_latency(latency);
            }
            if let Some(logging) = logging {
                builder.enable_logging(logging);
            }
            let request = builder.build().unwrap();

            let body = serde_json::to_value(&request).unwrap();
            let object = body.as_object().unwrap();
            prop_assert_eq!(object.get("text").and_then(|v| v.as_str()), Some(text.as_str()));
            prop_assert!(!object.contains_key("voice_id"));
            prop_assert!(!object.contains_key("optimize_streaming_latency"));
            prop_assert!(!object.contains_key("enable_logging"));

            let http = request.apply_query(HttpRequest::post("v1/text-to-speech/x"));
            prop_assert_eq!(
                http.query.len(),
                usize::from(latency.is_some()) + usize::from(logging.is_some())
            );
        }

        /// Unset voice settings are omitted from the body.
        #[test]
        fn prop_voice_settings_omit_unset(
            stability in arb_unit(),
            similarity_boost in arb_unit(),
            style in arb_unit(),
        ) {
            let settings = VoiceSettings {
                stability,
                similarity_boost,
                style,
                ..Default::default()
            };
            let value = serde_json::to_value(&settings).unwrap();
            let set = [stability, similarity_boost, style].iter().filter(|v| v.is_some()).count();
            prop_assert_eq!(value.as_object().unwrap().len(), set);

            let back: VoiceSettings = serde_json::from_value(value).unwrap();
            prop_assert_eq!(back.stability.is_some(), stability.is_some());
            prop_assert!(back.use_speaker_boost.is_none());
        }
    }

    // ===== Audio Properties =====

    proptest! {
        /// Buffers shorter than four bytes are always treated as raw PCM.
        #[test]
        fn prop_short_buffers_are_pcm(data in proptest::collection::vec(any::<u8>(), 0..4)) {
            prop_assert_eq!(detect_audio_format(&data), AudioFormat::Pcm);
        }

        /// Every output format parses back from its wire name.
        #[test]
        fn prop_output_format_wire_names(index in 0usize..11) {
            let names = [
                "mp3_22050_32", "mp3_44100_32", "mp3_44100_64", "mp3_44100_96",
                "mp3_44100_128", "mp3_44100_192", "pcm_16000", "pcm_22050",
                "pcm_24000", "pcm_44100", "ulaw_8000",
            ];
            let format: OutputFormat = names[index].parse().unwrap();
            prop_assert_eq!(format.as_str(), names[index]);
        }

        /// Concatenated audio chunks equal the body for any chunk size.
        #[test]
        fn prop_audio_stream_preserves_body(
            body in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk_size in 1usize..512,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let collected = runtime.block_on(async {
                let reader = std::io::Cursor::new(body.clone());
                let stream = AudioStream::new(ChunkStream::bytes(
                    reader,
                    chunk_size,
                    elevenlabs_transport::CancellationToken::new(),
                ));
                let chunks: Vec<Bytes> = stream.map(|chunk| chunk.unwrap()).collect().await;
                prop_assert!(chunks.iter().all(|chunk| chunk.len() <= chunk_size));
                Ok(chunks.concat())
            })?;
            prop_assert_eq!(collected, body);
        }
    }
}
