use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use log::warn;

use crate::components::particle_network::{DeviceTier, ParticleNetwork};

/// `?tier=low|medium|high` pins the backdrop quality; anything else falls back
/// to detection.
fn tier_override(raw: Option<String>) -> Option<DeviceTier> {
	let raw = raw?;
	match raw.parse() {
		Ok(tier) => Some(tier),
		Err(err) => {
			warn!("ignoring tier override: {err}");
			None
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let tier = Memo::new(move |_| tier_override(query.read().get("tier")));

	view! {
		<div class="fullscreen-backdrop" style="position: fixed; inset: 0;">
			// A new tier remounts the backdrop.
			{move || view! { <ParticleNetwork tier=tier.get() /> }}
			<div class="backdrop-overlay" style="position: relative; padding: 4rem 2rem; color: #e2e8f0;">
				<h1>"Particle Network"</h1>
				<p class="subtitle">"Add ?tier=low, ?tier=medium or ?tier=high to pin the quality tier."</p>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_override() {
		assert_eq!(tier_override(None), None);
		assert_eq!(tier_override(Some("medium".into())), Some(DeviceTier::Medium));
		assert_eq!(tier_override(Some("ultra".into())), None);
	}
}
