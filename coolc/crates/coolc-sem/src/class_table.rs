//! The global inheritance graph.
//!
//! Built once per program from the parsed classes plus synthetic entries
//! for the five basic classes. The graph is a tree rooted at `Object`;
//! construction rejects redefinitions, illegal parents and cycles, after
//! which every query is total.
//!
//! Iteration order matters: `defined_classes` walks the tree depth-first
//! from `Object` with children in insertion order, and the backend assigns
//! class tags from exactly that walk.

use coolc_par::{Attr, Class, Expr, Feature, Formal, Method};
use coolc_util::Names;
use indexmap::IndexMap;

use crate::error::SemanticError;

/// One node of the inheritance graph.
#[derive(Debug)]
struct Node {
    parent: String,
    children: Vec<String>,
}

/// The class table: inheritance graph plus the class definitions
/// themselves (user classes as parsed, basic classes synthesized here).
#[derive(Debug)]
pub struct ClassTable {
    graph: IndexMap<String, Node>,
    classes: IndexMap<String, Class>,
}

impl ClassTable {
    /// Builds and validates the table from the program's classes.
    pub fn new(user_classes: &[Class]) -> Result<Self, SemanticError> {
        let mut graph: IndexMap<String, Node> = IndexMap::new();
        let mut classes: IndexMap<String, Class> = IndexMap::new();

        for class in basic_classes() {
            graph.insert(
                class.name.clone(),
                Node {
                    parent: Names::OBJECT.to_string(),
                    children: Vec::new(),
                },
            );
            classes.insert(class.name.clone(), class);
        }
        // Basic children of Object, in tag-assignment order.
        for basic in [Names::IO, Names::INT, Names::BOOL, Names::STRING] {
            graph[Names::OBJECT].children.push(basic.to_string());
        }

        for class in user_classes {
            if Names::is_basic(&class.name) || class.name == Names::SELF_TYPE {
                return Err(SemanticError::BasicClassRedefined(class.name.clone()));
            }
            if graph.contains_key(&class.name) {
                return Err(SemanticError::ClassRedefined(class.name.clone()));
            }
            graph.insert(
                class.name.clone(),
                Node {
                    parent: class.parent.clone(),
                    children: Vec::new(),
                },
            );
            classes.insert(class.name.clone(), class.clone());
        }

        for class in user_classes {
            if class.parent == Names::SELF_TYPE || Names::is_primitive(&class.parent) {
                return Err(SemanticError::IllegalParent {
                    class: class.name.clone(),
                    parent: class.parent.clone(),
                });
            }
            if !graph.contains_key(&class.parent) {
                return Err(SemanticError::UndefinedParent {
                    class: class.name.clone(),
                    parent: class.parent.clone(),
                });
            }
            graph[&class.parent].children.push(class.name.clone());
        }

        let table = Self { graph, classes };
        for class in user_classes.iter().rev() {
            let mut visited = vec![class.name.clone()];
            table.check_cycle_from(&class.name, &mut visited)?;
        }
        Ok(table)
    }

    /// Walks the descendants of `name`; a class seen twice is caught in a
    /// cycle.
    fn check_cycle_from(&self, name: &str, visited: &mut Vec<String>) -> Result<(), SemanticError> {
        for child in &self.graph[name].children {
            if visited.iter().any(|seen| seen == child) {
                return Err(SemanticError::InheritanceCycle(child.clone()));
            }
            visited.push(child.clone());
            self.check_cycle_from(child, visited)?;
            visited.pop();
        }
        Ok(())
    }

    /// True for any class in the table; `SELF_TYPE` counts as defined.
    pub fn is_defined(&self, ty: &str) -> bool {
        ty == Names::SELF_TYPE || self.graph.contains_key(ty)
    }

    /// Is `a` a subtype of `b`? `Object` is a supertype of everything;
    /// otherwise `b` must appear on `a`'s ancestor chain. Unknown names
    /// are subtypes of nothing.
    pub fn is_subtype(&self, a: &str, b: &str) -> bool {
        if b == Names::OBJECT {
            return true;
        }
        let mut current = a;
        loop {
            if current == b {
                return true;
            }
            if current == Names::OBJECT {
                return false;
            }
            match self.graph.get(current) {
                Some(node) => current = &node.parent,
                None => return false,
            }
        }
    }

    /// Least upper bound: the deepest common ancestor of `a` and `b`.
    pub fn lub(&self, a: &str, b: &str) -> String {
        let chain_a = self.ancestor_chain(a);
        let chain_b = self.ancestor_chain(b);
        let mut last_common = Names::OBJECT.to_string();
        for (x, y) in chain_a.iter().zip(chain_b.iter()) {
            if x != y {
                break;
            }
            last_common = x.clone();
        }
        last_common
    }

    /// Root-to-leaf chain of `ty`, excluding `Object` itself.
    fn ancestor_chain(&self, ty: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = ty;
        while current != Names::OBJECT {
            match self.graph.get(current) {
                Some(node) => {
                    chain.push(current.to_string());
                    current = &node.parent;
                }
                None => return Vec::new(),
            }
        }
        chain.reverse();
        chain
    }

    /// Parent class name, or `None` for `Object` and unknown classes.
    pub fn get_parent(&self, ty: &str) -> Option<&str> {
        if ty == Names::OBJECT {
            return None;
        }
        self.graph.get(ty).map(|node| node.parent.as_str())
    }

    /// The class definition, basic classes included.
    pub fn get_class(&self, ty: &str) -> Option<&Class> {
        self.classes.get(ty)
    }

    /// Direct subclasses, in tag-assignment order.
    pub fn children_of(&self, ty: &str) -> &[String] {
        self.graph
            .get(ty)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attributes declared on `ty` itself, in declaration order.
    pub fn attributes_of(&self, ty: &str) -> Vec<&Attr> {
        self.classes
            .get(ty)
            .map(|class| class.attrs().collect())
            .unwrap_or_default()
    }

    /// All attributes of `ty` including inherited ones, parents first:
    /// the object layout order.
    pub fn all_attributes_of(&self, ty: &str) -> Vec<&Attr> {
        let mut attrs = match self.get_parent(ty) {
            Some(parent) => self.all_attributes_of(parent),
            None => Vec::new(),
        };
        attrs.extend(self.attributes_of(ty));
        attrs
    }

    /// Every defined class in inheritance-DFS order from `Object`; the
    /// backend numbers class tags by this order.
    pub fn defined_classes(&self) -> Vec<&str> {
        let mut result = Vec::with_capacity(self.graph.len());
        self.collect_dfs(Names::OBJECT, &mut result);
        result
    }

    fn collect_dfs<'a>(&'a self, name: &'a str, result: &mut Vec<&'a str>) {
        result.push(name);
        for child in self.children_of(name) {
            self.collect_dfs(child, result);
        }
    }
}

/// The five synthetic basic classes with their built-in members. The
/// method bodies are `NoExpr`; their code lives in the runtime.
fn basic_classes() -> Vec<Class> {
    let object = Class {
        line: 0,
        name: Names::OBJECT.into(),
        parent: Names::OBJECT.into(),
        filename: "<basic class>".into(),
        features: vec![
            builtin_method("abort", vec![], Names::OBJECT),
            builtin_method("type_name", vec![], Names::STRING),
            builtin_method("copy", vec![], Names::SELF_TYPE),
        ],
    };
    let io = Class {
        line: 0,
        name: Names::IO.into(),
        parent: Names::OBJECT.into(),
        filename: "<basic class>".into(),
        features: vec![
            builtin_method("out_string", vec![("x", Names::STRING)], Names::SELF_TYPE),
            builtin_method("out_int", vec![("x", Names::INT)], Names::SELF_TYPE),
            builtin_method("in_string", vec![], Names::STRING),
            builtin_method("in_int", vec![], Names::INT),
        ],
    };
    let int = Class {
        line: 0,
        name: Names::INT.into(),
        parent: Names::OBJECT.into(),
        filename: "<basic class>".into(),
        features: vec![builtin_attr("val", Names::INT)],
    };
    let bool_class = Class {
        line: 0,
        name: Names::BOOL.into(),
        parent: Names::OBJECT.into(),
        filename: "<basic class>".into(),
        features: vec![builtin_attr("val", Names::BOOL)],
    };
    let string = Class {
        line: 0,
        name: Names::STRING.into(),
        parent: Names::OBJECT.into(),
        filename: "<basic class>".into(),
        features: vec![
            builtin_attr("val", Names::INT),
            builtin_attr("str_field", Names::STRING),
            builtin_method("length", vec![], Names::INT),
            builtin_method("concat", vec![("s", Names::STRING)], Names::STRING),
            builtin_method(
                "substr",
                vec![("i", Names::INT), ("l", Names::INT)],
                Names::STRING,
            ),
        ],
    };
    vec![object, io, int, bool_class, string]
}

fn builtin_method(name: &str, formals: Vec<(&str, &str)>, return_type: &str) -> Feature {
    Feature::Method(Method {
        line: 0,
        name: name.into(),
        formals: formals
            .into_iter()
            .map(|(name, ty)| Formal {
                line: 0,
                name: name.into(),
                ty: ty.into(),
            })
            .collect(),
        return_type: return_type.into(),
        body: Expr::no_expr(0),
    })
}

fn builtin_attr(name: &str, ty: &str) -> Feature {
    Feature::Attr(Attr {
        line: 0,
        name: name.into(),
        ty: ty.into(),
        init: Expr::no_expr(0),
    })
}
