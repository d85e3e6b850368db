use promptforge::template::{MiniJinjaRenderer, TemplateRenderer, TEMPLATE_ERROR_PREFIX};
use serde_json::{json, Map};

fn context_of(pairs: &[(&str, serde_json::Value)]) -> Map<String, serde_json::Value> {
    pairs.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

#[test]
fn test_minijinja_engine() {
    let engine = MiniJinjaRenderer::new();
    let context = json!({
        "name": "test",
        "value": 42
    });

    let result = engine.render("Hello {{ name }}!", &context).unwrap();
    assert_eq!(result, "Hello test!");

    let result = engine.render("Value: {{ value }}", &context).unwrap();
    assert_eq!(result, "Value: 42");
}

#[test]
fn test_extract_is_sorted_and_deduplicated() {
    let engine = MiniJinjaRenderer::new();
    let template = "{{ zebra }} {{ apple }} {{ zebra }} {{ mango }}";
    assert_eq!(engine.extract_placeholders(template), vec!["apple", "mango", "zebra"]);
}

#[test]
fn test_extract_ignores_loop_bound_names() {
    let engine = MiniJinjaRenderer::new();
    let template = "{% for item in items %}{{ item }}{% endfor %}";
    assert_eq!(engine.extract_placeholders(template), vec!["items"]);
}

#[test]
fn test_extract_sees_conditional_references() {
    let engine = MiniJinjaRenderer::new();
    let template = "{% if flag %}{{ city }}{% endif %}";
    assert_eq!(engine.extract_placeholders(template), vec!["city", "flag"]);
}

#[test]
fn test_extract_excludes_reserved_context_names() {
    let engine = MiniJinjaRenderer::new();
    let template = "{{ now }} {{ user }} {{ app }} {{ topic }}";
    assert_eq!(engine.extract_placeholders(template), vec!["topic"]);
}

#[test]
fn test_extract_reserved_only_template_is_empty() {
    let engine = MiniJinjaRenderer::new();
    assert!(engine.extract_placeholders("Today is {{ now }}, dear {{ user }}.").is_empty());
}

#[test]
fn test_extract_falls_back_to_regex_scan() {
    let engine = MiniJinjaRenderer::new();
    // The unclosed block breaks the parser.
    let template = "{% if broken %}{{ name }} {{ city | upper }}";
    assert_eq!(engine.extract_placeholders(template), vec!["city", "name"]);
}

#[test]
fn test_extract_never_errors_on_garbage() {
    let engine = MiniJinjaRenderer::new();
    assert!(engine.extract_placeholders("{% {{ %} }}").is_empty());
}

#[test]
fn test_render_prompt_injects_fixed_context() {
    let engine = MiniJinjaRenderer::new();
    let context = context_of(&[("name", json!("Ada"))]);
    let rendered = engine.render_prompt("Hello {{ name }}, from {{ app }}", &context);
    assert_eq!(rendered, "Hello Ada, from PromptForge");
}

#[test]
fn test_fixed_context_cannot_be_overridden() {
    let engine = MiniJinjaRenderer::new();
    let context = context_of(&[("app", json!("Imposter")), ("user", json!("Imposter"))]);
    let rendered = engine.render_prompt("{{ app }}/{{ user }}", &context);
    assert_eq!(rendered, "PromptForge/User");
}

#[test]
fn test_custom_user_label() {
    let engine = MiniJinjaRenderer::with_user_label("Grace");
    let rendered = engine.render_prompt("Hi {{ user }}", &Map::new());
    assert_eq!(rendered, "Hi Grace");
}

#[test]
fn test_default_filter_covers_empty_strings() {
    let engine = MiniJinjaRenderer::new();
    let context = context_of(&[("name", json!(""))]);
    let rendered = engine.render_prompt("{{ name | default('anonymous') }}", &context);
    assert_eq!(rendered, "anonymous");

    let context = context_of(&[("name", json!("Ada"))]);
    let rendered = engine.render_prompt("{{ name | default('anonymous') }}", &context);
    assert_eq!(rendered, "Ada");
}

#[test]
fn test_render_failure_is_reported_in_band() {
    let engine = MiniJinjaRenderer::new();
    let context = context_of(&[("undefined_fn", json!("not callable"))]);
    let rendered = engine.render_prompt("{{ undefined_fn() }}", &context);
    assert!(rendered.starts_with(TEMPLATE_ERROR_PREFIX));
}

#[test]
fn test_strict_undefined_is_reported_in_band() {
    let engine = MiniJinjaRenderer::new();
    let rendered = engine.render_prompt("Hello {{ missing }}", &Map::new());
    assert!(rendered.starts_with(TEMPLATE_ERROR_PREFIX));
}

#[test]
fn test_conditionals_and_loops_render() {
    let engine = MiniJinjaRenderer::new();
    let context = context_of(&[("show", json!(true)), ("items", json!(["a", "b"]))]);
    let template = "{% if show %}yes{% endif %}:{% for item in items %}{{ item }}{% endfor %}";
    assert_eq!(engine.render_prompt(template, &context), "yes:ab");
}
