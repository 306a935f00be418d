//! PokéAPI integration: typed client, rate limiting, caching and the
//! degrade-to-none lookup seam the presentation side consumes.

pub mod cache;
pub mod lookup;
pub mod pokeapi;
pub mod rate_limiter;

pub use cache::ApiCache;
pub use lookup::PokemonLookup;
pub use pokeapi::{NamedResource, PokeApiClient, Pokemon, PokemonSpecies};
pub use rate_limiter::RateLimiter;
