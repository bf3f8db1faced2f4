use crate::catalog::Track;

/// Composes the instruction sent to the language model. The user's request is
/// embedded verbatim and the tracks are listed as pretty-printed JSON.
pub fn build_prompt(user_text: &str, tracks: &[Track]) -> String {
    // Serializing a Vec of plain Option<String> structs cannot fail.
    let track_list =
        serde_json::to_string_pretty(tracks).unwrap_or_else(|_| String::from("[]"));

    format!(
        "You are an AI DJ and remix advisor. The user wants to {user_text}. \
         Here are the tracks in their playlist: {track_list}.\n\
         Please provide specific suggestions on how to remix or modify these tracks \
         to achieve their desired effect.\n\
         Include specific techniques, effects, or transitions that would work well \
         with these tracks."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_request_and_track_names() {
        let tracks = vec![Track {
            name: Some("Song A".into()),
            artist: Some("Artist X".into()),
            album: Some("Alb".into()),
        }];
        let prompt = build_prompt("make it lofi", &tracks);
        assert!(prompt.contains("make it lofi"));
        assert!(prompt.contains("Song A"));
        assert!(prompt.contains("Artist X"));
        assert!(prompt.contains("Alb"));
    }

    #[test]
    fn request_text_is_not_escaped() {
        let prompt = build_prompt("add <b>\"hard\"</b> & fast drops", &[]);
        assert!(prompt.contains("add <b>\"hard\"</b> & fast drops"));
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let prompt = build_prompt("slow it down", &[Track::default()]);
        assert!(prompt.contains("\"name\": null"));
        assert!(prompt.contains("\"artist\": null"));
    }

    #[test]
    fn deterministic() {
        let tracks = vec![Track {
            name: Some("B".into()),
            ..Track::default()
        }];
        assert_eq!(build_prompt("x", &tracks), build_prompt("x", &tracks));
    }
}
