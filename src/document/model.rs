use std::collections::BTreeMap;

use crate::foundation::error::{FramestateError, FramestateResult};

/// Free-form document settings (`{"degreeMode": true, ...}`), kept sorted for stable equality.
pub type Settings = BTreeMap<String, serde_json::Value>;

/// Viewport edges in graph units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            left: -10.0,
            right: 10.0,
            top: 10.0,
            bottom: -10.0,
        }
    }
}

impl Bounds {
    /// Construct bounds from `left, right, top, bottom`.
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// All four edges are finite and the box is non-degenerate.
    pub fn validate(&self) -> FramestateResult<()> {
        let edges = [self.left, self.right, self.top, self.bottom];
        if !edges.iter().all(|v| v.is_finite()) {
            return Err(FramestateError::validation("bounds must be finite"));
        }
        if self.left >= self.right || self.bottom >= self.top {
            return Err(FramestateError::validation(
                "bounds must satisfy left < right and bottom < top",
            ));
        }
        Ok(())
    }
}

/// One expression row of the document.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entity {
    /// Stable entity id.
    pub id: String,
    /// Expression source, e.g. `a=3` or `y=a\sin(x)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    /// Whether the entity is hidden from the graph.
    #[serde(default)]
    pub hidden: bool,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Numeric properties (`lineWidth`, `opacity`, action run counters, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, f64>,
}

impl Entity {
    /// Name of the variable this entity assigns, if its expression has the form `name=...`.
    ///
    /// Accepts plain identifiers (`a`, `speed`) and subscripted ones (`a_{1}`, `a_1`).
    pub fn defined_variable(&self) -> Option<&str> {
        let latex = self.latex.as_deref()?;
        let (lhs, rhs) = latex.split_once('=')?;
        let name = lhs.trim();
        if rhs.trim().is_empty() || !is_identifier(name) {
            return None;
        }
        Some(name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '{' | '}'))
}

/// Partial update of one entity; absent fields are left untouched (upsert semantics).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityPatch {
    /// Target entity id.
    pub id: String,
    /// New expression source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    /// New visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// New color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Numeric properties to set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, f64>,
}

impl EntityPatch {
    /// Empty patch targeting `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the expression source.
    pub fn with_latex(mut self, latex: impl Into<String>) -> Self {
        self.latex = Some(latex.into());
        self
    }

    /// Set visibility.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Set the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set one numeric property.
    pub fn with_prop(mut self, name: impl Into<String>, value: f64) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Merge this patch into an existing entity.
    pub fn apply_to(&self, entity: &mut Entity) {
        if let Some(latex) = &self.latex {
            entity.latex = Some(latex.clone());
        }
        if let Some(hidden) = self.hidden {
            entity.hidden = hidden;
        }
        if let Some(color) = &self.color {
            entity.color = Some(color.clone());
        }
        for (k, v) in &self.props {
            entity.props.insert(k.clone(), *v);
        }
    }

    /// Build a fresh entity from this patch.
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity {
            id: self.id.clone(),
            ..Entity::default()
        };
        self.apply_to(&mut entity);
        entity
    }
}

/// Complete serializable document state.
///
/// This is a value type: `Clone` is a deep copy and `PartialEq` is structural equality, which is
/// what the cache boundary and the determinism guarantees rely on.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentState {
    /// Expression rows in document order.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Viewport.
    #[serde(default)]
    pub bounds: Bounds,
    /// Document settings.
    #[serde(default)]
    pub settings: Settings,
}

impl DocumentState {
    /// Look up an entity by id.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Apply a patch, appending a new entity when `patch.id` is unknown.
    pub fn upsert(&mut self, patch: &EntityPatch) {
        match self.entities.iter_mut().find(|e| e.id == patch.id) {
            Some(entity) => patch.apply_to(entity),
            None => self.entities.push(patch.to_entity()),
        }
    }

    /// Remove an entity; returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        self.entities.len() != before
    }

    /// Merge settings (`null` values delete keys).
    pub fn merge_settings(&mut self, partial: &Settings) {
        for (k, v) in partial {
            if v.is_null() {
                self.settings.remove(k);
            } else {
                self.settings.insert(k.clone(), v.clone());
            }
        }
    }

    /// Stable 64-bit content fingerprint.
    pub fn fingerprint(&self) -> u64 {
        // serde_json output is deterministic here: fields are declared in a fixed order and all
        // maps are BTreeMaps.
        match serde_json::to_vec(self) {
            Ok(bytes) => xxhash_rust::xxh3::xxh3_64(&bytes),
            Err(_) => 0,
        }
    }

    /// Structural checks applied to imported snapshots.
    pub fn validate(&self) -> FramestateResult<()> {
        let mut seen = std::collections::BTreeSet::new();
        for e in &self.entities {
            if e.id.is_empty() {
                return Err(FramestateError::validation("entity id must be non-empty"));
            }
            if !seen.insert(e.id.as_str()) {
                return Err(FramestateError::validation(format!(
                    "duplicate entity id '{}'",
                    e.id
                )));
            }
            if e.props.values().any(|v| !v.is_finite()) {
                return Err(FramestateError::validation(format!(
                    "entity '{}' has a non-finite property",
                    e.id
                )));
            }
        }
        self.bounds.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
