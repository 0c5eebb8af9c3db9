// Route extraction from urls.py

use crate::config::Conventions;
use crate::model::Route;
use crate::parser::walk::named_children;
use crate::parser::{assignment, call_site, identifier, simple_name, string_literal, CallSite, SourceFile};

/// Entries of the top-level route list (`urlpatterns = [...]`, `urlpatterns += [...]`)
///
/// Every literal assignment contributes, in source order; a later plain
/// assignment does not discard earlier routes.
pub fn extract_routes(app: &str, file: &SourceFile, conventions: &Conventions) -> Vec<Route> {
    let source = file.bytes();
    let mut routes = Vec::new();

    for statement in file.statements() {
        let Some(assign) = assignment(&statement) else {
            continue;
        };
        let targets_routes = assign
            .target_names(source)
            .iter()
            .any(|n| *n == conventions.route_list);
        let Some(list) = assign.value.filter(|v| targets_routes && v.kind() == "list") else {
            continue;
        };

        for item in named_children(&list) {
            if let Some(call) = call_site(&item, source) {
                routes.push(route_entry(app, &call, source, conventions));
            }
        }
    }

    log::debug!("{} routes in {}", routes.len(), app);
    routes
}

/// One `path(...)`/`re_path(...)` call; shapes that are not literal leave fields unset
fn route_entry(app: &str, call: &CallSite, source: &[u8], conventions: &Conventions) -> Route {
    let mut route = Route {
        app: app.to_string(),
        path: call.positional.first().and_then(|p| string_literal(p, source)),
        handler: None,
        name: call.keyword("name").and_then(|n| string_literal(&n, source)),
        include: None,
    };

    let Some(target) = call.positional.get(1) else {
        return route;
    };

    match target.kind() {
        "call" => {
            let Some(inner) = call_site(target, source) else {
                return route;
            };
            if identifier(&inner.function, source).as_deref() == Some(conventions.include_call.as_str()) {
                route.include = inner.positional.first().and_then(|m| string_literal(m, source));
            } else if is_as_view(&inner, source) {
                // `PostList.as_view()` targets the class handler
                route.handler = inner
                    .function
                    .child_by_field_name("object")
                    .and_then(|object| simple_name(&object, source));
            }
        }
        "attribute" | "identifier" => route.handler = simple_name(target, source),
        _ => {}
    }

    route
}

fn is_as_view(call: &CallSite, source: &[u8]) -> bool {
    call.function.kind() == "attribute" && simple_name(&call.function, source).as_deref() == Some("as_view")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use indoc::indoc;

    fn extract(source: &str) -> Vec<Route> {
        let file = PythonParser::new()
            .unwrap()
            .parse_source(source.to_string(), "urls.py".into())
            .unwrap();
        extract_routes("blog", &file, &Conventions::default())
    }

    #[test]
    fn test_route_shapes() {
        let routes = extract(indoc! {r#"
            from django.urls import include, path, re_path
            from . import views

            urlpatterns = [
                path("", views.index, name="home"),
                path("about/", about),
                path("posts/", PostList.as_view(), name="post-list"),
                path("api/", include("blog.api.urls")),
                re_path(r"^archive/(?P<year>\d+)/$", views.archive, name=ARCHIVE),
                path(PREFIX + "x/", lambda request: None),
                "not a call",
            ]
        "#});

        assert_eq!(routes.len(), 6);

        assert_eq!(routes[0].path.as_deref(), Some(""));
        assert_eq!(routes[0].handler.as_deref(), Some("index"));
        assert_eq!(routes[0].name.as_deref(), Some("home"));
        assert_eq!(routes[0].include, None);

        assert_eq!(routes[1].handler.as_deref(), Some("about"));
        assert_eq!(routes[1].name, None);

        assert_eq!(routes[2].handler.as_deref(), Some("PostList"));

        assert_eq!(routes[3].include.as_deref(), Some("blog.api.urls"));
        assert_eq!(routes[3].handler, None);

        assert_eq!(routes[4].path.as_deref(), Some(r"^archive/(?P<year>\d+)/$"));
        assert_eq!(routes[4].name, None);

        assert_eq!(routes[5].path, None);
        assert_eq!(routes[5].handler, None);
        assert!(routes.iter().all(|r| r.app == "blog"));
    }

    #[test]
    fn test_augmented_route_list() {
        let routes = extract(indoc! {r#"
            urlpatterns = [path("a/", a)]
            urlpatterns += [path("b/", b)]
            other = [path("c/", c)]
        "#});
        let handlers: Vec<_> = routes.iter().filter_map(|r| r.handler.as_deref()).collect();
        assert_eq!(handlers, vec!["a", "b"]);
    }

    #[test]
    fn test_repeated_route_list_assignments_accumulate() {
        let routes = extract(indoc! {r#"
            urlpatterns = [path("a/", a)]
            urlpatterns = [path("b/", b), path("c/", c)]
        "#});
        let paths: Vec<_> = routes.iter().filter_map(|r| r.path.as_deref()).collect();
        assert_eq!(paths, vec!["a/", "b/", "c/"]);
    }

    #[test]
    fn test_non_list_route_value_ignored() {
        assert!(extract("urlpatterns = router.urls\n").is_empty());
        assert!(extract("def f():\n    urlpatterns = [path('x/', x)]\n").is_empty());
    }
}
