//! Persona character card loader.

use std::path::Path;

use adabrain_types::character::CharacterCard;

/// Load the character card at `path`.
///
/// A missing, unreadable or non-JSON file yields [`CharacterCard::fallback`]
/// with a warning; the relay always starts with some persona.
pub async fn load_character(path: &Path) -> CharacterCard {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Character card not found at {} ({err}), using fallback", path.display());
            return CharacterCard::fallback();
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(document) if document.is_object() => CharacterCard::from_value(document),
        Ok(_) => {
            tracing::warn!("Character card at {} is not a JSON object, using fallback", path.display());
            CharacterCard::fallback()
        }
        Err(err) => {
            tracing::warn!("Failed to parse character card {}: {err}, using fallback", path.display());
            CharacterCard::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_card_uses_fallback() {
        let tmp = TempDir::new().unwrap();
        let card = load_character(&tmp.path().join("nope.json")).await;
        assert_eq!(card, CharacterCard::fallback());
        assert_eq!(card.system_prompt(), "You are Ada Marie.");
    }

    #[tokio::test]
    async fn wrapped_card_is_loaded_whole() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("card.json");
        tokio::fs::write(
            &path,
            r#"{"spec":"chara_card_v2","data":{"name":"Ada Marie","system_prompt":"Be warm.","tags":["unicorn"]}}"#,
        )
        .await
        .unwrap();

        let card = load_character(&path).await;
        assert_eq!(card.system_prompt(), "Be warm.");
        assert_eq!(card.document()["spec"], "chara_card_v2");
        assert_eq!(card.document()["data"]["tags"][0], "unicorn");
    }

    #[tokio::test]
    async fn invalid_json_uses_fallback() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("card.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert_eq!(load_character(&path).await, CharacterCard::fallback());

        tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();
        assert_eq!(load_character(&path).await, CharacterCard::fallback());
    }
}
