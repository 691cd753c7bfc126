use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found" style="padding: 4rem 2rem;">
			<h1>"Page not found"</h1>
			<p>"The page you are looking for does not exist."</p>
			<a href="/">"Back home"</a>
		</div>
	}
}
