//! Google Translate text-to-speech URLs.

use reqwest::Url;

use crate::error::DeliveryFailure;

/// Longest text the TTS endpoint accepts in one request.
pub const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct TtsOptions {
    pub lang: String,
    pub slow: bool,
    pub host: String,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            slow: false,
            host: "https://translate.google.com".to_string(),
        }
    }
}

/// Builds the URL of an MP3 rendering of `text`.
pub fn audio_url(text: &str, options: &TtsOptions) -> Result<Url, DeliveryFailure> {
    let len = text.chars().count();
    if len == 0 {
        return Err(DeliveryFailure::EmptyText);
    }
    if len > MAX_TEXT_LEN {
        return Err(DeliveryFailure::TextTooLong {
            len,
            limit: MAX_TEXT_LEN,
        });
    }

    let base = format!("{}/translate_tts", options.host.trim_end_matches('/'));
    let mut url = Url::parse(&base).map_err(|e| DeliveryFailure::InvalidUrl {
        url: base.clone(),
        message: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("ie", "UTF-8")
        .append_pair("q", text)
        .append_pair("tl", &options.lang)
        .append_pair("total", "1")
        .append_pair("idx", "0")
        .append_pair("textlen", &len.to_string())
        .append_pair("client", "tw-ob")
        .append_pair("prev", "input")
        .append_pair("ttsspeed", if options.slow { "0.24" } else { "1" });

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_url_query() {
        let url = audio_url("Next trains", &TtsOptions::default()).unwrap();

        assert_eq!(url.host_str(), Some("translate.google.com"));
        assert_eq!(url.path(), "/translate_tts");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "Next trains".to_string())));
        assert!(pairs.contains(&("tl".to_string(), "en".to_string())));
        assert!(pairs.contains(&("textlen".to_string(), "11".to_string())));
        assert!(pairs.contains(&("client".to_string(), "tw-ob".to_string())));
        assert!(pairs.contains(&("ttsspeed".to_string(), "1".to_string())));
    }

    #[test]
    fn test_slow_speed_and_trailing_slash_host() {
        let options = TtsOptions {
            lang: "es".to_string(),
            slow: true,
            host: "https://translate.google.com/".to_string(),
        };
        let url = audio_url("hola", &options).unwrap();

        assert!(url.as_str().starts_with("https://translate.google.com/translate_tts?"));
        assert!(url.query_pairs().any(|(k, v)| k == "ttsspeed" && v == "0.24"));
    }

    #[test]
    fn test_rejects_empty_and_long_text() {
        assert!(matches!(
            audio_url("", &TtsOptions::default()),
            Err(DeliveryFailure::EmptyText)
        ));

        let long = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            audio_url(&long, &TtsOptions::default()),
            Err(DeliveryFailure::TextTooLong { len: 201, limit: 200 })
        ));
        assert!(audio_url(&"a".repeat(MAX_TEXT_LEN), &TtsOptions::default()).is_ok());
    }
}
