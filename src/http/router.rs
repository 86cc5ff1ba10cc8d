//! Regex based router. Routes are tried in the order they were added.

use regex::Regex;

type ParamsConverter<R> = Fn(Vec<&str>) -> Option<R> + Send + Sync;

pub struct RouteParser<R> {
    regex_and_converters: Vec<(Regex, Box<ParamsConverter<R>>)>,
}

impl<R> Default for RouteParser<R> {
    fn default() -> Self {
        Self {
            regex_and_converters: Vec::new(),
        }
    }
}

impl<R> RouteParser<R> {
    /// Adds a route without params, `f` builds the route value
    pub fn add_route<F>(&mut self, regex_pattern: &str, f: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.add_route_with_params(regex_pattern, move |_| Some(f()));
    }

    /// Adds a route whose captured groups are passed to `converter`
    pub fn add_route_with_params<F>(&mut self, regex_pattern: &str, converter: F)
    where
        F: Fn(Vec<&str>) -> Option<R> + Send + Sync + 'static,
    {
        let regex = Regex::new(regex_pattern).unwrap_or_else(|e| panic!("Invalid route pattern {}: {}", regex_pattern, e));
        self.regex_and_converters.push((regex, Box::new(converter)));
    }

    /// Finds the first route matching the path
    pub fn test(&self, route: &str) -> Option<R> {
        self.regex_and_converters.iter().filter_map(|&(ref regex, ref converter)| {
            regex.captures(route).and_then(|captures| {
                let params = captures
                    .iter()
                    .skip(1)
                    .filter_map(|capture| capture.map(|m| m.as_str()))
                    .collect::<Vec<&str>>();
                converter(params)
            })
        }).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Route {
        Items,
        Item(i32),
        ItemChild(i32, i32),
    }

    fn parser() -> RouteParser<Route> {
        let mut router = RouteParser::default();
        router.add_route(r"^/items$", || Route::Items);
        router.add_route_with_params(r"^/items/(\d+)$", |params| {
            params.get(0).and_then(|id| id.parse().ok()).map(Route::Item)
        });
        router.add_route_with_params(r"^/items/(\d+)/children/(\d+)$", |params| {
            match (params.get(0).and_then(|id| id.parse().ok()), params.get(1).and_then(|id| id.parse().ok())) {
                (Some(id), Some(child)) => Some(Route::ItemChild(id, child)),
                _ => None,
            }
        });
        router
    }

    #[test]
    fn matches_routes() {
        let router = parser();
        assert_eq!(router.test("/items"), Some(Route::Items));
        assert_eq!(router.test("/items/12"), Some(Route::Item(12)));
        assert_eq!(router.test("/items/1/children/2"), Some(Route::ItemChild(1, 2)));
        assert_eq!(router.test("/items/abc"), None);
        assert_eq!(router.test("/unknown"), None);
    }

    #[test]
    fn rejects_overflowing_ids() {
        let router = parser();
        assert_eq!(router.test("/items/99999999999"), None);
    }
}
