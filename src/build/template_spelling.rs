use crate::db::types::clean_spelling;
use crate::db::TypeDescriptor;
use crate::kinds::TypeKind;

/// Split the top-level arguments out of a template spelling such as
/// `Map<Key, Vec<int>>`.  Returns the template name and the argument
/// spellings, or `None` if there is no argument list.
pub fn split_template_spelling(spelling: &str) -> Option<(&str, Vec<&str>)> {
    let open = spelling.find('<')?;
    let name = spelling[..open].trim();

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut arg_start = open + 1;
    for (pos, c) in spelling[open + 1..].char_indices() {
        let pos = pos + open + 1;
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' if depth > 0 => depth -= 1,
            '>' => {
                push_arg(&mut args, &spelling[arg_start..pos]);
                return Some((name, args));
            }
            ',' if depth == 0 => {
                push_arg(&mut args, &spelling[arg_start..pos]);
                arg_start = pos + 1;
            }
            _ => {}
        }
    }
    // Unterminated list; take what we have.
    push_arg(&mut args, &spelling[arg_start..]);
    Some((name, args))
}

fn push_arg<'a>(args: &mut Vec<&'a str>, arg: &'a str) {
    let arg = arg.trim();
    if !arg.is_empty() {
        args.push(arg);
    }
}

/// Give unresolved template types some structure: an `Unexposed` type whose
/// spelling carries template arguments gets a `TemplateTypeName` child for
/// the template and a `TemplateParameter` child per argument.  Applied to the
/// whole descriptor tree.
pub fn expand_template_types(desc: &TypeDescriptor) -> TypeDescriptor {
    let mut out = TypeDescriptor {
        kind: desc.kind,
        spelling: desc.spelling.clone(),
        is_const: desc.is_const,
        children: desc.children.iter().map(expand_template_types).collect(),
    };
    if out.kind != TypeKind::UNEXPOSED || !out.children.is_empty() {
        return out;
    }
    if let Some((name, args)) = split_template_spelling(clean_spelling(desc)) {
        out.children.push(TypeDescriptor {
            kind: TypeKind::TEMPLATE_TYPE_NAME,
            spelling: name.to_string(),
            ..TypeDescriptor::default()
        });
        for arg in args {
            out.children.push(TypeDescriptor {
                kind: TypeKind::TEMPLATE_PARAMETER,
                spelling: arg.to_string(),
                ..TypeDescriptor::default()
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_arguments_stay_whole() {
        assert_eq!(
            split_template_spelling("std::map<Key, std::vector<int>>"),
            Some(("std::map", vec!["Key", "std::vector<int>"]))
        );
        assert_eq!(
            split_template_spelling("Fn<void (int, char)>"),
            Some(("Fn", vec!["void (int, char)"]))
        );
        assert_eq!(split_template_spelling("int"), None);
    }

    #[test]
    fn unexposed_template_gets_placeholder_children() {
        let desc = TypeDescriptor {
            kind: TypeKind::UNEXPOSED,
            spelling: "Box<T, U>".to_string(),
            ..TypeDescriptor::default()
        };
        let expanded = expand_template_types(&desc);
        let kinds: Vec<(TypeKind, &str)> = expanded
            .children
            .iter()
            .map(|c| (c.kind, c.spelling.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TypeKind::TEMPLATE_TYPE_NAME, "Box"),
                (TypeKind::TEMPLATE_PARAMETER, "T"),
                (TypeKind::TEMPLATE_PARAMETER, "U"),
            ]
        );
        assert_eq!(expanded.spelling, "Box<T, U>");
    }

    #[test]
    fn resolved_types_are_left_alone() {
        let desc = TypeDescriptor {
            kind: TypeKind::RECORD,
            spelling: "Box<int>".to_string(),
            ..TypeDescriptor::default()
        };
        assert!(expand_template_types(&desc).children.is_empty());
    }
}
