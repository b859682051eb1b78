//! Read-only traversal over the AST.

use crate::{Expr, Module, ModuleElement, Rule};

impl Expr {
    /// Direct child expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Reference(_) => vec![],
            Expr::Optional(expr)
            | Expr::Many(expr)
            | Expr::Some(expr)
            | Expr::Nested(expr)
            | Expr::Repeat { expr, .. }
            | Expr::Labeled { expr, .. } => vec![expr.as_ref()],
            Expr::Sequence(lhs, rhs) | Expr::Choice(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }

    /// Visit this expression and all of its descendants, parents first.
    pub fn walk<'e, F: FnMut(&'e Expr)>(&'e self, f: &mut F) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            f(expr);
            stack.extend(expr.children().into_iter().rev());
        }
    }

    /// The operands of a chain of sequences, in source order. Groups are
    /// not looked through.
    pub fn flatten_sequence(&self) -> Vec<&Expr> {
        flatten(self, |expr| match expr {
            Expr::Sequence(lhs, rhs) => Some((lhs.as_ref(), rhs.as_ref())),
            _ => None,
        })
    }

    /// The alternatives of a chain of choices, in source order. Groups are
    /// not looked through.
    pub fn flatten_choice(&self) -> Vec<&Expr> {
        flatten(self, |expr| match expr {
            Expr::Choice(lhs, rhs) => Some((lhs.as_ref(), rhs.as_ref())),
            _ => None,
        })
    }

    /// The text matched by an expression made only of fully resolved
    /// literals, sequences and groups, or `None` if it can match anything
    /// else.
    pub fn static_text(&self) -> Option<String> {
        match self {
            Expr::Literal(text) if text.is_resolved() => Some(text.text().to_owned()),
            Expr::Nested(expr) => expr.static_text(),
            Expr::Sequence(..) => self
                .flatten_sequence()
                .into_iter()
                .map(Expr::static_text)
                .collect(),
            _ => None,
        }
    }

    /// Names referenced anywhere in this expression, in source order and
    /// with repeats. Labels are not references.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |expr| {
            if let Expr::Reference(name) = expr {
                out.push(name.as_str());
            }
        });
        out
    }
}

/// Split `expr` with `split` until no part splits any further. Uses an
/// explicit stack since chains can be as long as the rule body.
fn flatten<'e, F>(expr: &'e Expr, split: F) -> Vec<&'e Expr>
where
    F: Fn(&'e Expr) -> Option<(&'e Expr, &'e Expr)>,
{
    let mut out = Vec::new();
    let mut stack = vec![expr];
    while let Some(expr) = stack.pop() {
        match split(expr) {
            Some((lhs, rhs)) => {
                stack.push(rhs);
                stack.push(lhs);
            }
            None => out.push(expr),
        }
    }
    out
}

impl Module {
    /// Every rule in this module and the modules nested in it, depth first
    /// in source order.
    pub fn rules(&self) -> Vec<&Rule> {
        let mut out = Vec::new();
        collect_rules(self, &mut out);
        out
    }

    /// Modules declared directly in this one.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.elements.iter().filter_map(|element| match element {
            ModuleElement::Module(module) => Some(module),
            ModuleElement::Rule(_) => None,
        })
    }

    /// First rule called `name` declared directly in this module.
    pub fn lookup(&self, name: &str) -> Option<&Rule> {
        self.elements.iter().find_map(|element| match element {
            ModuleElement::Rule(rule) if rule.name.as_str() == name => Some(rule),
            _ => None,
        })
    }
}

fn collect_rules<'m>(module: &'m Module, out: &mut Vec<&'m Rule>) {
    for element in &module.elements {
        match element {
            ModuleElement::Rule(rule) => out.push(rule),
            ModuleElement::Module(module) => collect_rules(module, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse, parse_expr, Expr, LiteralText};

    #[test]
    fn flatten_chains() {
        let expr = parse_expr("a b (c d) e | f | g h").unwrap();

        let alternatives: Vec<String> = expr
            .flatten_choice()
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(alternatives, vec!["a b (c d) e", "f", "g h"]);

        let first = expr.flatten_choice()[0];
        let operands: Vec<String> = first
            .flatten_sequence()
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(operands, vec!["a", "b", "(c d)", "e"]);

        assert_eq!(parse_expr("a").unwrap().flatten_sequence().len(), 1);
    }

    #[test]
    fn walk_visits_parents_first() {
        let expr = parse_expr("x:a? \"b\"{2,}").unwrap();
        let mut seen = Vec::new();
        expr.walk(&mut |e: &Expr| seen.push(e.to_string()));
        assert_eq!(
            seen,
            vec!["x:a? \"b\"{2,}", "x:a?", "a?", "a", "\"b\"{2,}", "\"b\""]
        );
    }

    #[test]
    fn static_text() {
        let tests = vec![
            ("\"a\"", Some("a")),
            ("\"a\" (\"b\" \"c\")", Some("abc")),
            ("\"a\" b", None),
            ("\"a\" | \"b\"", None),
            ("\"a\"?", None),
        ];
        for (input, expected) in tests {
            let expr = parse_expr(input).unwrap();
            assert_eq!(expr.static_text().as_deref(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn references() {
        let expr = parse_expr("a l:(b | \"c\") a*").unwrap();
        assert_eq!(expr.references(), vec!["a", "b", "a"]);
        assert!(parse_expr("\"x\"").unwrap().references().is_empty());
    }

    #[test]
    fn unresolved_names_are_not_static() {
        let expr = parse_expr("\"a\\N{B}\" \"c\"").unwrap();
        assert_eq!(expr.static_text(), None);

        let mut text = LiteralText::from("a");
        text.push_unresolved("B");
        assert_eq!(expr.flatten_sequence()[0], &Expr::Literal(text));
    }

    #[test]
    fn long_chains() {
        let names: Vec<String> = (0..5_000).map(|i| format!("r{}", i)).collect();
        let expr = parse_expr(&names.join(" ")).unwrap();
        assert_eq!(expr.flatten_sequence().len(), names.len());
        assert_eq!(expr.references().len(), names.len());
        assert_eq!(expr.to_string(), names.join(" "));

        let expr = parse_expr(&names.join(" | ")).unwrap();
        assert_eq!(expr.flatten_choice().len(), names.len());
        assert_eq!(expr.to_string(), names.join(" | "));
    }

    #[test]
    fn module_queries() {
        let module = parse("a = \"1\" mod m { b = \"2\" mod n { c = \"3\" } } d = \"4\" a = \"5\"").unwrap();

        let names: Vec<&str> = module.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "a"]);

        let modules: Vec<String> = module
            .modules()
            .filter_map(|m| m.name.as_ref().map(|n| n.to_string()))
            .collect();
        assert_eq!(modules, vec!["m"]);

        assert_eq!(module.lookup("a").unwrap().body, Expr::literal("1"));
        assert!(module.lookup("b").is_none());
        let m = module.modules().next().unwrap();
        assert_eq!(m.lookup("b").unwrap().body, Expr::literal("2"));
    }
}
