/// How words are delimited in a locale's writing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    SpaceDelimited,
    /// Scripts written without spaces between words (Chinese, Japanese, Cantonese).
    Unsegmented,
}

impl Script {
    pub fn for_locale(locale: &str) -> Self {
        match language_subtag(locale).as_str() {
            "zh" | "ja" | "yue" => Self::Unsegmented,
            _ => Self::SpaceDelimited,
        }
    }
}

pub const FALLBACK_VOICE: &str = "en-US-JennyNeural";

/// Default neural synthesis voice for a locale, keyed on its language subtag.
pub fn default_voice_for_locale(locale: &str) -> &'static str {
    match language_subtag(locale).as_str() {
        "ar" => "ar-EG-SalmaNeural",
        "en" => "en-US-JennyNeural",
        "zh" => "zh-CN-XiaoxiaoNeural",
        "fr" => "fr-FR-DeniseNeural",
        "es" => "es-ES-ElviraNeural",
        "de" => "de-DE-KatjaNeural",
        "it" => "it-IT-ElsaNeural",
        "ja" => "ja-JP-NanamiNeural",
        "ko" => "ko-KR-SunHiNeural",
        "pt" => "pt-BR-FranciscaNeural",
        "ru" => "ru-RU-DariyaNeural",
        "tr" => "tr-TR-EmelNeural",
        _ => FALLBACK_VOICE,
    }
}

fn language_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_and_japanese_are_unsegmented() {
        assert_eq!(Script::for_locale("zh-CN"), Script::Unsegmented);
        assert_eq!(Script::for_locale("zh_TW"), Script::Unsegmented);
        assert_eq!(Script::for_locale("ja-JP"), Script::Unsegmented);
        assert_eq!(Script::for_locale("en-US"), Script::SpaceDelimited);
        assert_eq!(Script::for_locale(""), Script::SpaceDelimited);
    }

    #[test]
    fn voice_lookup_uses_language_prefix() {
        assert_eq!(default_voice_for_locale("ar-SA"), "ar-EG-SalmaNeural");
        assert_eq!(default_voice_for_locale("EN-gb"), "en-US-JennyNeural");
        assert_eq!(default_voice_for_locale("zh-CN"), "zh-CN-XiaoxiaoNeural");
        assert_eq!(default_voice_for_locale("ru-RU"), "ru-RU-DariyaNeural");
        assert_eq!(default_voice_for_locale("hi-IN"), FALLBACK_VOICE);
        assert_eq!(default_voice_for_locale("xx-YY"), FALLBACK_VOICE);
        assert_eq!(default_voice_for_locale(""), FALLBACK_VOICE);
    }
}
