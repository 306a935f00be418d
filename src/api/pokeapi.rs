//! PokéAPI client for card-entry assistance (names, sprites, species data).
//!
//! Uses async reqwest for non-blocking HTTP requests. The base URL is
//! injectable so tests can point the client at a local mock server.

use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
const USER_AGENT: &str = "card_manager/1.0";

/// A Pokémon as PokéAPI returns it, trimmed to the fields the app uses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub base_experience: Option<i64>,
    pub height: i64,
    pub weight: i64,
    #[serde(default)]
    pub sprites: Option<Sprites>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub species: Option<NamedResource>,
}

impl Pokemon {
    /// Default front sprite, when the API has one
    pub fn image_url(&self) -> Option<&str> {
        self.sprites.as_ref()?.front_default.as_deref()
    }

    /// Type names in slot order
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.kind.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub back_shiny: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: i64,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSlot {
    pub base_stat: i64,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonSpecies {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub generation: Option<NamedResource>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    pub names: Vec<LocalizedName>,
}

impl PokemonSpecies {
    /// First flavor text in the given language, newlines normalised
    pub fn flavor_text(&self, language: &str) -> Option<String> {
        self.flavor_text_entries
            .iter()
            .find(|e| e.language.name == language)
            .map(|e| e.flavor_text.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
    #[serde(default)]
    pub version: Option<NamedResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub language: NamedResource,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[allow(dead_code)]
    count: i64,
    results: Vec<NamedResource>,
}

/// Thin typed client over the PokéAPI REST endpoints.
pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::HttpStatus(response.status()));
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn pokemon_by_name(&self, name: &str) -> AppResult<Pokemon> {
        let slug = slugify(name)?;
        self.get_json(&format!("pokemon/{}", slug)).await
    }

    pub async fn pokemon_by_id(&self, id: i64) -> AppResult<Pokemon> {
        self.get_json(&format!("pokemon/{}", id)).await
    }

    pub async fn species_by_name(&self, name: &str) -> AppResult<PokemonSpecies> {
        let slug = slugify(name)?;
        self.get_json(&format!("pokemon-species/{}", slug)).await
    }

    /// One page of the full Pokémon index.
    pub async fn list_pokemon(&self, limit: usize, offset: usize) -> AppResult<Vec<NamedResource>> {
        let list: ResourceList = self
            .get_json(&format!("pokemon?limit={}&offset={}", limit, offset))
            .await?;
        Ok(list.results)
    }

    pub async fn pokemon_image_url(&self, name: &str) -> AppResult<Option<String>> {
        let pokemon = self.pokemon_by_name(name).await?;
        Ok(pokemon.image_url().map(str::to_string))
    }
}

fn slugify(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("pokemon name is empty".to_string()));
    }
    Ok(urlencoding::encode(&trimmed.to_lowercase()).into_owned())
}

#[cfg(test)]
#[path = "pokeapi_tests.rs"]
mod tests;
