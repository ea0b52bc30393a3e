//! XML documents returned by the inventory service and their mapping to [`GameEntity`].

use serde::Deserialize;
use tracing::debug;

use super::error::{BggError, BggResult};
use crate::dao::models::{GameEntity, GameInfoEntity};

/// Body of `/collection`. An unknown user yields an `<errors>` root instead of `<items>`.
#[derive(Debug, Deserialize)]
pub(super) struct CollectionDocument {
    #[serde(rename = "item", default)]
    items: Vec<CollectionItem>,
    #[serde(rename = "error", default)]
    errors: Vec<ErrorNode>,
}

#[derive(Debug, Deserialize)]
struct CollectionItem {
    #[serde(rename = "@objectid")]
    object_id: String,
    name: TextNode,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    stats: Option<CollectionStats>,
}

#[derive(Debug, Deserialize)]
struct CollectionStats {
    #[serde(rename = "@minplayers", default)]
    min_players: Option<String>,
    #[serde(rename = "@maxplayers", default)]
    max_players: Option<String>,
    #[serde(rename = "@minplaytime", default)]
    min_playtime: Option<String>,
    #[serde(rename = "@maxplaytime", default)]
    max_playtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorNode {
    #[serde(default)]
    message: Option<String>,
}

/// Body of `/thing`.
#[derive(Debug, Deserialize)]
pub(super) struct ThingDocument {
    #[serde(rename = "item", default)]
    items: Vec<ThingItem>,
}

#[derive(Debug, Deserialize)]
struct ThingItem {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(rename = "name", default)]
    names: Vec<NameNode>,
    #[serde(default)]
    minplayers: Option<ValueNode>,
    #[serde(default)]
    maxplayers: Option<ValueNode>,
    #[serde(default)]
    minplaytime: Option<ValueNode>,
    #[serde(default)]
    maxplaytime: Option<ValueNode>,
}

#[derive(Debug, Deserialize)]
struct NameNode {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "@value", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ValueNode {
    #[serde(rename = "@value", default)]
    value: String,
}

impl CollectionDocument {
    /// Parse a collection body into the user's games.
    pub(super) fn parse(body: &str) -> BggResult<Vec<GameEntity>> {
        let document: Self =
            quick_xml::de::from_str(body).map_err(|source| BggError::MalformedResponse {
                endpoint: "collection",
                source,
            })?;

        if let Some(error) = document.errors.into_iter().next() {
            return Err(BggError::Rejected {
                message: error.message.unwrap_or_default().trim().to_owned(),
            });
        }

        Ok(document.items.into_iter().map(CollectionItem::into_game).collect())
    }
}

impl CollectionItem {
    fn into_game(self) -> GameEntity {
        let id = self.object_id;
        let info = match self.stats {
            Some(stats) => GameInfoEntity {
                min_players: parse_count(&id, "minplayers", stats.min_players.as_deref()),
                max_players: parse_count(&id, "maxplayers", stats.max_players.as_deref()),
                min_playtime: parse_count(&id, "minplaytime", stats.min_playtime.as_deref()),
                max_playtime: parse_count(&id, "maxplaytime", stats.max_playtime.as_deref()),
            },
            None => GameInfoEntity::default(),
        };
        GameEntity {
            name: self.name.text.trim().to_owned(),
            thumbnail: trimmed(self.thumbnail),
            info,
            id,
        }
    }
}

impl ThingDocument {
    /// Parse a thing body and return the game with identifier `id`.
    pub(super) fn parse(id: &str, body: &str) -> BggResult<GameEntity> {
        let document: Self =
            quick_xml::de::from_str(body).map_err(|source| BggError::MalformedResponse {
                endpoint: "thing",
                source,
            })?;

        document
            .items
            .into_iter()
            .next()
            .map(ThingItem::into_game)
            .ok_or_else(|| BggError::NotFound { id: id.to_owned() })
    }
}

impl ThingItem {
    fn into_game(self) -> GameEntity {
        let id = self.id;
        let name = self
            .names
            .iter()
            .find(|name| name.kind == "primary")
            .or_else(|| self.names.first())
            .map(|name| name.value.clone())
            .unwrap_or_default();

        let info = GameInfoEntity {
            min_players: parse_value(&id, "minplayers", self.minplayers),
            max_players: parse_value(&id, "maxplayers", self.maxplayers),
            min_playtime: parse_value(&id, "minplaytime", self.minplaytime),
            max_playtime: parse_value(&id, "maxplaytime", self.maxplaytime),
        };

        GameEntity {
            name,
            thumbnail: trimmed(self.thumbnail),
            info,
            id,
        }
    }
}

fn parse_value(id: &str, field: &'static str, node: Option<ValueNode>) -> u32 {
    parse_count(id, field, node.as_ref().map(|node| node.value.as_str()))
}

/// Parse one numeric field. A bad value only zeroes that field.
fn parse_count(id: &str, field: &'static str, raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<u32>() {
        Ok(value) => value,
        Err(err) => {
            debug!(game = id, field, raw, error = %err, "ignoring unparsable numeric field");
            0
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|value| value.trim().to_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<items totalitems="2" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse" pubdate="Sat, 17 Oct 2026 10:00:00 +0000">
    <item objecttype="thing" objectid="13" subtype="boardgame" collid="1">
        <name sortindex="1">Catan</name>
        <yearpublished>1995</yearpublished>
        <image>https://cf.geekdo-images.com/catan-full.jpg</image>
        <thumbnail>
            https://cf.geekdo-images.com/catan.jpg
        </thumbnail>
        <stats minplayers="3" maxplayers="4" minplaytime="60" maxplaytime="120" playingtime="120" numowned="100">
            <rating value="N/A"><usersrated value="1"/></rating>
        </stats>
        <status own="1" prevowned="0" fortrade="0" want="0"/>
        <numplays>3</numplays>
    </item>
    <item objecttype="thing" objectid="230802" subtype="boardgame" collid="2">
        <name sortindex="1">Azul</name>
        <stats minplayers="2" maxplayers="four" minplaytime="30" maxplaytime="45"/>
    </item>
</items>"#;

    const THING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item type="boardgame" id="822">
        <thumbnail>https://cf.geekdo-images.com/carcassonne.jpg</thumbnail>
        <image>https://cf.geekdo-images.com/carcassonne-full.jpg</image>
        <name type="alternate" sortindex="1" value="Carcassonne: Die Stadt" />
        <name type="primary" sortindex="1" value="Carcassonne" />
        <description>Tile laying.</description>
        <yearpublished value="2000" />
        <minplayers value="2" />
        <maxplayers value="5" />
        <playingtime value="45" />
        <minplaytime value="thirty" />
        <maxplaytime value="45" />
        <link type="boardgamecategory" id="1035" value="Medieval" />
        <link type="boardgamemechanic" id="2002" value="Tile Placement" />
    </item>
</items>"#;

    #[test]
    fn collection_items_become_games() {
        let games = CollectionDocument::parse(COLLECTION).unwrap();
        assert_eq!(games.len(), 2);

        let catan = &games[0];
        assert_eq!(catan.id, "13");
        assert_eq!(catan.name, "Catan");
        assert_eq!(catan.thumbnail, "https://cf.geekdo-images.com/catan.jpg");
        assert_eq!(catan.info.min_players, 3);
        assert_eq!(catan.info.max_playtime, 120);

        let azul = &games[1];
        assert_eq!(azul.thumbnail, "");
        assert_eq!(azul.info.max_players, 0);
        assert_eq!(azul.info.min_players, 2);
    }

    #[test]
    fn empty_collection_is_not_an_error() {
        let games = CollectionDocument::parse(r#"<items totalitems="0"></items>"#).unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn error_document_is_rejected() {
        let body = r#"<errors><error><message>Invalid username specified</message></error></errors>"#;
        match CollectionDocument::parse(body) {
            Err(BggError::Rejected { message }) => {
                assert_eq!(message, "Invalid username specified")
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn non_xml_collection_is_malformed() {
        assert!(matches!(
            CollectionDocument::parse("<items><item objectid=\"1\">"),
            Err(BggError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn thing_prefers_primary_name_and_keeps_partial_info() {
        let game = ThingDocument::parse("822", THING).unwrap();
        assert_eq!(game.id, "822");
        assert_eq!(game.name, "Carcassonne");
        assert_eq!(game.thumbnail, "https://cf.geekdo-images.com/carcassonne.jpg");
        assert_eq!(game.info.min_players, 2);
        assert_eq!(game.info.max_players, 5);
        assert_eq!(game.info.min_playtime, 0);
        assert_eq!(game.info.max_playtime, 45);
    }

    #[test]
    fn thing_without_items_is_not_found() {
        let body = r#"<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse"></items>"#;
        assert!(matches!(
            ThingDocument::parse("999999999", body),
            Err(BggError::NotFound { id }) if id == "999999999"
        ));
    }
}
