//! Local anime registry.
//!
//! [`AnimeRegistry`] is the seam the season database talks to. The bundled
//! [`AnimeDatabase`] keeps every item in memory, keyed by [`AnimeId`], and
//! persists the whole set as a single XML file.

use crate::domain::{AnimeId, FuzzyDate, ServiceId};
use crate::models::anime::{AgeRating, AnimeItem, AnimeType};
use crate::xml::{
    XmlDocument, XmlElement, XmlError, XmlNodeType, attr_or_create, child_or_create, read_int,
    read_str, save_document, write_child_nodes, write_int, write_str,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const DATABASE_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Item has no ID for its source service ({0})")]
    MissingSourceId(ServiceId),

    #[error("Invalid {service} ID: {id:?}")]
    InvalidId { service: ServiceId, id: String },

    #[error("Registry file error: {0}")]
    Xml(#[from] XmlError),
}

/// Store of every known anime, keyed by local ID.
pub trait AnimeRegistry {
    fn find_item(&self, id: AnimeId) -> Option<&AnimeItem>;

    /// Finds the item whose ID on `service` equals `external_id`.
    fn find_by_service_id(&self, service: ServiceId, external_id: &str) -> Option<&AnimeItem>;

    /// Inserts `item`, or merges it into the existing entry with the same ID.
    ///
    /// # Errors
    ///
    /// - Returns [`RegistryError::MissingSourceId`] if the item has no ID for
    ///   its source service
    /// - Returns [`RegistryError::InvalidId`] if that ID is not numeric
    fn update_item(&mut self, item: AnimeItem) -> Result<AnimeId, RegistryError>;

    /// All items in ascending ID order.
    fn items(&self) -> Box<dyn Iterator<Item = &AnimeItem> + '_>;

    /// Persists the registry.
    fn save(&self) -> Result<(), RegistryError>;
}

#[derive(Debug, Clone, Default)]
pub struct AnimeDatabase {
    path: PathBuf,
    items: BTreeMap<AnimeId, AnimeItem>,
}

impl AnimeDatabase {
    /// Creates an empty registry that saves to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            items: BTreeMap::new(),
        }
    }

    /// Loads the registry file at `path`. A missing file yields an empty
    /// registry.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let mut database = Self::new(path);

        if !database.path.exists() {
            debug!(path = %database.path.display(), "Anime database not found, starting empty");
            return Ok(database);
        }

        let document = XmlDocument::load_file(&database.path)?;
        let Some(root) = document.child("database") else {
            warn!(path = %database.path.display(), "Anime database has no <database> root");
            return Ok(database);
        };

        for node in root.children("anime") {
            match item_from_xml(node) {
                Some(item) => {
                    database.items.insert(item.id, item);
                }
                None => debug!(title = node.child_value("title"), "Skipping unreadable anime entry"),
            }
        }

        info!(
            path = %database.path.display(),
            count = database.items.len(),
            "Loaded anime database"
        );
        Ok(database)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn to_document(&self) -> XmlDocument {
        let mut document = XmlDocument::new();
        let root = document.append_child("database");
        write_str(
            child_or_create(root, "meta"),
            "version",
            DATABASE_VERSION,
            XmlNodeType::Text,
        );

        for item in self.items.values() {
            item_to_xml(root.append_child("anime"), item);
        }

        document
    }
}

impl AnimeRegistry for AnimeDatabase {
    fn find_item(&self, id: AnimeId) -> Option<&AnimeItem> {
        self.items.get(&id)
    }

    fn find_by_service_id(&self, service: ServiceId, external_id: &str) -> Option<&AnimeItem> {
        if external_id.is_empty() {
            return None;
        }
        self.items
            .values()
            .find(|item| item.service_id(service) == Some(external_id))
    }

    fn update_item(&mut self, mut item: AnimeItem) -> Result<AnimeId, RegistryError> {
        let source_id = item
            .service_id(item.source)
            .ok_or(RegistryError::MissingSourceId(item.source))?;

        let id = source_id
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id >= 0)
            .map(AnimeId::new)
            .ok_or_else(|| RegistryError::InvalidId {
                service: item.source,
                id: source_id.to_string(),
            })?;

        if let Some(existing) = self.items.get_mut(&id) {
            existing.merge(item);
        } else {
            item.id = id;
            self.items.insert(id, item);
        }

        Ok(id)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &AnimeItem> + '_> {
        Box::new(self.items.values())
    }

    fn save(&self) -> Result<(), RegistryError> {
        save_document(&self.to_document(), &self.path)?;
        info!(
            path = %self.path.display(),
            count = self.items.len(),
            "Saved anime database"
        );
        Ok(())
    }
}

fn item_to_xml(node: &mut XmlElement, item: &AnimeItem) {
    for (service, external_id) in &item.ids {
        let id_node = node.append_child("id");
        attr_or_create(id_node, "name").value = service.as_str().to_string();
        id_node.set_text(external_id.as_str());
    }

    write_str(node, "source", item.source.as_str(), XmlNodeType::Text);
    write_str(node, "title", &item.title, XmlNodeType::CData);
    write_int(node, "type", item.anime_type.code());
    write_str(node, "image", &item.image_url, XmlNodeType::Text);
    write_str(node, "trailer", &item.trailer_url, XmlNodeType::Text);
    write_child_nodes(
        child_or_create(node, "producers"),
        &item.producers,
        "producer",
        XmlNodeType::Text,
    );
    write_child_nodes(
        child_or_create(node, "genres"),
        &item.genres,
        "genre",
        XmlNodeType::Text,
    );
    write_str(node, "synopsis", &item.synopsis, XmlNodeType::CData);
    write_str(
        node,
        "date_start",
        &item.date_start.to_string(),
        XmlNodeType::Text,
    );
    write_int(node, "age_rating", item.age_rating.code());
    write_str(
        node,
        "last_modified",
        &item.last_modified.to_string(),
        XmlNodeType::Text,
    );
}

fn item_from_xml(node: &XmlElement) -> Option<AnimeItem> {
    let source = read_str(node, "source").parse::<ServiceId>().ok()?;
    let mut item = AnimeItem::new(source);

    for id_node in node.children("id") {
        if let Ok(service) = id_node.attribute_value("name").parse::<ServiceId>() {
            item.set_id(service, id_node.text().trim());
        }
    }

    let id = item
        .service_id(source)?
        .parse::<i32>()
        .ok()
        .filter(|id| *id >= 0)?;
    item.id = AnimeId::new(id);
    item.title = read_str(node, "title");
    item.anime_type = AnimeType::from_code(read_int(node, "type"));
    item.image_url = read_str(node, "image");
    item.trailer_url = read_str(node, "trailer");
    item.producers = child_texts(node, "producers", "producer");
    item.genres = child_texts(node, "genres", "genre");
    item.synopsis = read_str(node, "synopsis");
    item.date_start = FuzzyDate::parse_lossy(node.child_value("date_start"));
    item.age_rating = AgeRating::from_code(read_int(node, "age_rating"));
    item.last_modified = node.child_value("last_modified").trim().parse().unwrap_or(0);

    Some(item)
}

fn child_texts(node: &XmlElement, list: &str, name: &str) -> Vec<String> {
    node.child(list)
        .map(|parent| {
            parent
                .children(name)
                .map(|child| child.text().to_owned())
                .collect()
        })
        .unwrap_or_default()
}
