//! Cached, rate-limited Pokémon lookups.
//!
//! This is the seam the presentation side talks to: every API failure is
//! logged and degrades to "no data" instead of propagating, so a network
//! outage never breaks card entry.

use crate::api::cache::ApiCache;
use crate::api::pokeapi::{PokeApiClient, Pokemon, PokemonSpecies};
use crate::api::rate_limiter::RateLimiter;
use crate::sets;
use std::time::Duration;

const RATE_KEY: &str = "pokeapi";

pub struct PokemonLookup {
    client: PokeApiClient,
    cache: ApiCache,
    limiter: RateLimiter,
}

impl PokemonLookup {
    pub fn new(client: PokeApiClient) -> Self {
        Self {
            client,
            cache: ApiCache::default(),
            // PokéAPI fair-use: keep bursts small
            limiter: RateLimiter::new(5, Duration::from_secs(1)),
        }
    }

    pub async fn pokemon(&self, name: &str) -> Option<Pokemon> {
        let slug = normalize(name)?;
        let key = format!("pokemon/{}", slug);
        if let Some(hit) = self.cache.get::<Pokemon>(&key) {
            return Some(hit);
        }

        self.limiter.acquire(RATE_KEY).await;
        match self.client.pokemon_by_name(&slug).await {
            Ok(pokemon) => {
                self.cache.set(&key, &pokemon, None);
                Some(pokemon)
            }
            Err(e) => {
                log::warn!("Pokémon lookup failed for {}: {}", slug, e);
                None
            }
        }
    }

    pub async fn species(&self, name: &str) -> Option<PokemonSpecies> {
        let slug = normalize(name)?;
        let key = format!("species/{}", slug);
        if let Some(hit) = self.cache.get::<PokemonSpecies>(&key) {
            return Some(hit);
        }

        self.limiter.acquire(RATE_KEY).await;
        match self.client.species_by_name(&slug).await {
            Ok(species) => {
                self.cache.set(&key, &species, None);
                Some(species)
            }
            Err(e) => {
                log::warn!("Species lookup failed for {}: {}", slug, e);
                None
            }
        }
    }

    pub async fn image_url(&self, name: &str) -> Option<String> {
        self.pokemon(name).await?.image_url().map(str::to_string)
    }

    /// Likely TCG sets for a Pokémon: by its species' generation when the
    /// API answers, by dex-id range when only the Pokémon record is known,
    /// otherwise the full catalog.
    pub async fn suggested_sets(&self, name: &str) -> Vec<String> {
        if let Some(species) = self.species(name).await {
            let generation = species.generation.as_ref().map(|g| g.name.as_str());
            return sets::sets_for_generation(generation);
        }
        if let Some(pokemon) = self.pokemon(name).await {
            return sets::sets_for_pokemon_id(pokemon.id);
        }
        sets::all_sets()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn normalize(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
