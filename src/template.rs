use minijinja::Environment;
use serde::Serialize;

/// Renders `template_str` using `${ var }` delimiters. Undefined variables are
/// an error.
pub fn render_template<S: Serialize>(template_str: &str, ctx: S) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();

    let syntax = minijinja::syntax::SyntaxConfig::builder()
        .variable_delimiters("${", "}")
        .build()?;

    env.set_syntax(syntax);
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

    let template = env.template_from_str(template_str)?;
    template.render(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_renders_dollar_delimiters() {
        let mut vars = HashMap::new();
        vars.insert("TOKEN", "abc:123");
        let rendered = render_template("bot_token = \"${ TOKEN }\"", &vars).expect("render");
        assert_eq!(rendered, "bot_token = \"abc:123\"");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let vars: HashMap<&str, &str> = HashMap::new();
        assert!(render_template("${ MISSING }", &vars).is_err());
    }

    #[test]
    fn test_block_tags_still_work() {
        let ctx = minijinja::context! { log_file => Option::<String>::None };
        let rendered =
            render_template("{% if log_file %}file{% else %}none{% endif %}", ctx).expect("render");
        assert_eq!(rendered, "none");
    }
}
