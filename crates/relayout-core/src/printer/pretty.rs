//! Default fallback printer with Scala-like surface syntax

use super::FallbackPrinter;
use crate::config::RegenConfig;
use crate::error::PrintError;
use crate::tree::{Modifier, ModifierToken, Node, NodeKind, Tag, Tree};

/// Prints trees from scratch, ignoring positions
#[derive(Debug, Clone, Default)]
pub struct PrettyPrinter {
    config: RegenConfig,
}

impl PrettyPrinter {
    pub fn new(config: RegenConfig) -> Self {
        Self { config }
    }

    fn newline(&self, depth: usize, out: &mut String) {
        out.push_str(self.config.line_ending.as_str());
        out.push_str(&self.config.indent.at_depth(depth));
    }

    fn write_all(
        &self,
        items: &[Tree],
        separator: &str,
        depth: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            self.write(item, depth, out)?;
        }
        Ok(())
    }

    fn write_modifiers(&self, mods: &[ModifierToken], out: &mut String) {
        for keyword in mods.iter().filter_map(|m| m.flag.keyword()) {
            out.push_str(keyword);
            out.push(' ');
        }
    }

    fn write_type_params(&self, tparams: &[Tree], out: &mut String) {
        if tparams.is_empty() {
            return;
        }
        out.push('[');
        for (i, tparam) in tparams.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(tparam.name().unwrap_or("_"));
        }
        out.push(']');
    }

    /// `name: Type = default`, used for value parameters
    fn write_param(&self, param: &Node, depth: usize, out: &mut String) -> Result<(), PrintError> {
        let NodeKind::Val { name, tpt, rhs, .. } = param.kind() else {
            return self.write(param, depth, out);
        };
        out.push_str(&name.text);
        if let Some(tpt) = tpt {
            out.push_str(": ");
            self.write(tpt, depth, out)?;
        }
        if let Some(rhs) = rhs {
            out.push_str(" = ");
            self.write(rhs, depth, out)?;
        }
        Ok(())
    }

    fn write_params(&self, params: &[Tree], depth: usize, out: &mut String) -> Result<(), PrintError> {
        out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_param(param, depth, out)?;
        }
        out.push(')');
        Ok(())
    }

    fn write_template(
        &self,
        template: &Node,
        with_params: bool,
        depth: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        let NodeKind::Template {
            parents,
            super_args,
            self_type,
            body,
        } = template.kind()
        else {
            return self.write(template, depth, out);
        };

        let (params, members): (Vec<Tree>, Vec<Tree>) = body
            .iter()
            .cloned()
            .partition(|stat| stat.has_modifier(Modifier::ParamAccessor));

        if with_params && !params.is_empty() {
            self.write_params(&params, depth, out)?;
        }

        if let Some((first, rest)) = parents.split_first() {
            out.push_str(" extends ");
            self.write(first, depth, out)?;
            if !super_args.is_empty() {
                out.push('(');
                self.write_all(super_args, ", ", depth, out)?;
                out.push(')');
            }
            for parent in rest {
                out.push_str(" with ");
                self.write(parent, depth, out)?;
            }
        }

        if self_type.is_some() || !members.is_empty() {
            out.push_str(" {");
            if let Some(self_type) = self_type {
                out.push(' ');
                self.write(self_type, depth + 1, out)?;
            }
            for member in &members {
                self.newline(depth + 1, out);
                self.write(member, depth + 1, out)?;
            }
            self.newline(depth, out);
            out.push('}');
        }
        Ok(())
    }

    fn write(&self, node: &Node, depth: usize, out: &mut String) -> Result<(), PrintError> {
        match node.kind() {
            NodeKind::Package { pid, stats } => {
                out.push_str("package ");
                self.write(pid, depth, out)?;
                for stat in stats {
                    out.push_str(self.config.line_ending.as_str());
                    self.newline(depth, out);
                    self.write(stat, depth, out)?;
                }
            }
            NodeKind::Class {
                mods,
                name,
                tparams,
                template,
            } => {
                self.write_modifiers(mods, out);
                out.push_str("class ");
                out.push_str(&name.text);
                self.write_type_params(tparams, out);
                self.write_template(template, true, depth, out)?;
            }
            NodeKind::Module {
                mods,
                name,
                template,
            } => {
                self.write_modifiers(mods, out);
                out.push_str("object ");
                out.push_str(&name.text);
                self.write_template(template, false, depth, out)?;
            }
            NodeKind::Template { .. } => self.write_template(node, false, depth, out)?,
            NodeKind::Val {
                mods,
                name,
                tpt,
                rhs,
            } => {
                if node.has_modifier(Modifier::ParamAccessor) {
                    return self.write_param(node, depth, out);
                }
                self.write_modifiers(mods, out);
                out.push_str("val ");
                out.push_str(&name.text);
                if let Some(tpt) = tpt {
                    out.push_str(": ");
                    self.write(tpt, depth, out)?;
                }
                if let Some(rhs) = rhs {
                    out.push_str(" = ");
                    self.write(rhs, depth, out)?;
                }
            }
            NodeKind::Def {
                mods,
                name,
                tparams,
                vparamss,
                tpt,
                rhs,
            } => {
                self.write_modifiers(mods, out);
                out.push_str("def ");
                out.push_str(&name.text);
                self.write_type_params(tparams, out);
                for params in vparamss {
                    self.write_params(params, depth, out)?;
                }
                if let Some(tpt) = tpt {
                    out.push_str(": ");
                    self.write(tpt, depth, out)?;
                }
                if let Some(rhs) = rhs {
                    out.push_str(" = ");
                    self.write(rhs, depth, out)?;
                }
            }
            NodeKind::TypeDef {
                mods,
                name,
                tparams,
                rhs,
            } => {
                self.write_modifiers(mods, out);
                out.push_str("type ");
                out.push_str(&name.text);
                self.write_type_params(tparams, out);
                if let Some(rhs) = rhs {
                    out.push_str(" = ");
                    self.write(rhs, depth, out)?;
                }
            }
            NodeKind::Ident { name } | NodeKind::NameTree { name } => out.push_str(name),
            NodeKind::Literal { value } => out.push_str(&value.to_string()),
            NodeKind::This { qual } => {
                if let Some(qual) = qual {
                    out.push_str(&qual.text);
                    out.push('.');
                }
                out.push_str("this");
            }
            NodeKind::Select { qualifier, name } => {
                self.write(qualifier, depth, out)?;
                out.push('.');
                out.push_str(&name.text);
            }
            NodeKind::Apply { fun, args } | NodeKind::SuperCall { fun, args } => {
                self.write(fun, depth, out)?;
                out.push('(');
                self.write_all(args, ", ", depth, out)?;
                out.push(')');
            }
            NodeKind::New { tpt } => {
                out.push_str("new ");
                self.write(tpt, depth, out)?;
            }
            NodeKind::Typed { expr, tpt } => {
                self.write(expr, depth, out)?;
                out.push_str(": ");
                self.write(tpt, depth, out)?;
            }
            NodeKind::Match { selector, cases } => {
                self.write(selector, depth, out)?;
                out.push_str(" match {");
                for case in cases {
                    self.newline(depth + 1, out);
                    self.write(case, depth + 1, out)?;
                }
                self.newline(depth, out);
                out.push('}');
            }
            NodeKind::Case { pat, guard, body } => {
                out.push_str("case ");
                self.write(pat, depth, out)?;
                if let Some(guard) = guard {
                    out.push_str(" if ");
                    self.write(guard, depth, out)?;
                }
                out.push_str(" => ");
                self.write(body, depth, out)?;
            }
            NodeKind::Bind { name, body } => {
                out.push_str(&name.text);
                out.push_str(" @ ");
                self.write(body, depth, out)?;
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push_str("if (");
                self.write(cond, depth, out)?;
                out.push_str(") ");
                self.write(then_branch, depth, out)?;
                if let Some(else_branch) = else_branch {
                    out.push_str(" else ");
                    self.write(else_branch, depth, out)?;
                }
            }
            NodeKind::Function { params, body } => {
                match params.as_slice() {
                    [param] if matches!(param.kind(), NodeKind::Val { tpt: None, .. }) => {
                        self.write_param(param, depth, out)?
                    }
                    _ => self.write_params(params, depth, out)?,
                }
                out.push_str(" => ");
                self.write(body, depth, out)?;
            }
            NodeKind::Import { expr, selectors } => {
                out.push_str("import ");
                self.write(expr, depth, out)?;
                out.push('.');
                match selectors.as_slice() {
                    [single]
                        if matches!(single.kind(), NodeKind::ImportSelector { rename: None, .. }) =>
                    {
                        self.write(single, depth, out)?
                    }
                    _ => {
                        out.push('{');
                        self.write_all(selectors, ", ", depth, out)?;
                        out.push('}');
                    }
                }
            }
            NodeKind::ImportSelector { name, rename } => {
                out.push_str(&name.text);
                if let Some(rename) = rename {
                    out.push_str(" => ");
                    out.push_str(&rename.text);
                }
            }
            NodeKind::Block { stats } => {
                if stats.is_empty() {
                    out.push_str("{}");
                } else {
                    out.push('{');
                    for stat in stats {
                        self.newline(depth + 1, out);
                        self.write(stat, depth + 1, out)?;
                    }
                    self.newline(depth, out);
                    out.push('}');
                }
            }
            NodeKind::ModifierTree { flag } => match flag.keyword() {
                Some(keyword) => out.push_str(keyword),
                None => return Err(PrintError::Unsupported(Tag::ModifierTree)),
            },
            NodeKind::SelfType { name, tpt } => {
                out.push_str(&name.text);
                if let Some(tpt) = tpt {
                    out.push_str(": ");
                    self.write(tpt, depth, out)?;
                }
                out.push_str(" =>");
            }
        }
        Ok(())
    }
}

impl FallbackPrinter for PrettyPrinter {
    fn print(&self, node: &Node) -> Result<String, PrintError> {
        let mut out = String::new();
        self.write(node, 0, &mut out)?;
        Ok(out)
    }
}
