//! The assembly module: drives code generation over the typed AST.
//!
//! One [`AsmModule`] per program. Class tags are assigned in
//! inheritance-DFS order, which makes every class's descendants a
//! contiguous tag range; typecase is compiled to range tests against
//! `[tag, last_descendant_tag]`. Expression emission follows the
//! accumulator convention: every expression leaves its result object in
//! `$a0`, temporaries live on the stack.

use coolc_par::{Class, Expr, ExprKind, Method, Program};
use coolc_sem::TypeEnvironment;
use coolc_util::Names;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::consts::ConstPool;
use crate::context::{Context, Location};
use crate::mips::{Addr, Mips, Reg};
use crate::tables::{DispatchTable, Prototype};
use crate::CodegenError;

/// Offset of the dispatch-table pointer inside any object.
const DISPTAB_OFFSET: i32 = 8;
/// Offset of the payload / first attribute inside any object.
const PAYLOAD_OFFSET: i32 = 12;

/// Generates the complete SPIM module for a type-checked program.
pub fn generate(program: &Program, env: &TypeEnvironment) -> Result<String, CodegenError> {
    AsmModule::new(env).generate(program)
}

/// Class tags in inheritance-DFS order, with each class's last
/// descendant tag (preorder numbering makes subtrees contiguous).
pub(crate) struct Tags {
    tags: IndexMap<String, usize>,
    last_descendant: FxHashMap<String, usize>,
}

impl Tags {
    pub(crate) fn new(env: &TypeEnvironment) -> Self {
        let mut tags = IndexMap::new();
        for (tag, class) in env.class_table.defined_classes().iter().enumerate() {
            tags.insert(class.to_string(), tag);
        }
        let mut last_descendant = FxHashMap::default();
        for class in tags.keys() {
            let size = subtree_size(env, class);
            last_descendant.insert(class.clone(), tags[class] + size - 1);
        }
        Self {
            tags,
            last_descendant,
        }
    }

    pub(crate) fn tag(&self, class: &str) -> usize {
        self.tags[class]
    }

    pub(crate) fn last_descendant(&self, class: &str) -> usize {
        self.last_descendant[class]
    }
}

fn subtree_size(env: &TypeEnvironment, class: &str) -> usize {
    1 + env
        .class_table
        .children_of(class)
        .iter()
        .map(|child| subtree_size(env, child))
        .sum::<usize>()
}

struct AsmModule<'a> {
    env: &'a TypeEnvironment,
    mips: Mips,
    consts: ConstPool,
    tags: Tags,
    prototypes: Vec<Prototype>,
    dispatch_tables: Vec<DispatchTable>,
    context: Context,
    label_index: usize,
    /// Class whose code is being emitted; resolves `SELF_TYPE`.
    current_class: String,
    /// Source file of the current class, for runtime abort messages.
    filename: String,
}

impl<'a> AsmModule<'a> {
    fn new(env: &'a TypeEnvironment) -> Self {
        let mut mips = Mips::new();
        // Data segment header; the rest of the data is appended by
        // `finish` once all constants are known.
        mips.data().align(2);
        // `heap_start` is emitted into the text buffer before the
        // `.text` directive, so the assembler still places it at the end
        // of the data segment.
        mips.set_text_mode();
        mips.global(Names::HEAP_START)
            .label(Names::HEAP_START)
            .word(0)
            .text()
            .global(&Names::form_init(Names::INT))
            .global(&Names::form_init(Names::STRING))
            .global(&Names::form_init(Names::BOOL))
            .global(&Names::form_init(Names::MAIN))
            .global(&Names::form_method(Names::MAIN, Names::MAIN_METHOD));

        let tags = Tags::new(env);
        let mut prototypes = Vec::new();
        let mut dispatch_tables = Vec::new();
        for class in env.class_table.defined_classes() {
            let attr_types: Vec<String> = env
                .class_table
                .all_attributes_of(class)
                .iter()
                .map(|attr| attr.ty.clone())
                .collect();
            prototypes.push(Prototype::new(class, tags.tag(class), attr_types));

            let methods: Vec<(String, String)> = env
                .method_env
                .methods_for(class)
                .map(|(name, info)| (info.owner.clone(), name.to_string()))
                .collect();
            dispatch_tables.push(DispatchTable::new(class, methods));
        }

        Self {
            env,
            mips,
            consts: ConstPool::new(),
            tags,
            prototypes,
            dispatch_tables,
            context: Context::new(),
            label_index: 0,
            current_class: String::new(),
            filename: String::new(),
        }
    }

    fn generate(mut self, program: &Program) -> Result<String, CodegenError> {
        let user_classes: FxHashMap<&str, &Class> = program
            .classes
            .iter()
            .map(|class| (class.name.as_str(), class))
            .collect();

        for name in self.env.class_table.defined_classes() {
            self.emit_init(name, user_classes.get(name).copied())?;
        }
        for name in self.env.class_table.defined_classes() {
            if let Some(class) = user_classes.get(name) {
                for method in class.methods() {
                    self.emit_method(class, method)?;
                }
            }
        }
        self.finish();
        Ok(self.mips.end())
    }

    /// `{Class}_init`: run the parent's init, then the class's own
    /// attribute initializers.
    fn emit_init(&mut self, name: &str, user_class: Option<&Class>) -> Result<(), CodegenError> {
        self.mips.label(&Names::form_init(name));
        self.mips.prolog();
        if name != Names::OBJECT {
            let parent = self
                .env
                .class_table
                .get_parent(name)
                .ok_or_else(|| CodegenError::UnknownClass(name.to_string()))?
                .to_string();
            self.mips.jal(&Names::form_init(&parent));

            if let Some(class) = user_class {
                self.enter_class_code(class);
                self.context.enter_method(std::iter::empty());
                let inherited = match self.env.class_table.get_parent(name) {
                    Some(parent) => self.env.class_table.all_attributes_of(parent).len(),
                    None => 0,
                };
                for (i, attr) in class.attrs().enumerate() {
                    if attr.init.is_no_expr() {
                        self.emit_default(&attr.ty);
                    } else {
                        self.emit_expr(&attr.init)?;
                    }
                    let offset = PAYLOAD_OFFSET + 4 * (inherited + i) as i32;
                    self.mips.sw(Reg::Acc, Addr(Reg::S0, offset));
                    self.mips.gen_gc_assign(offset);
                }
            }
        }
        self.mips.mov(Reg::Acc, Reg::S0);
        self.mips.epilog(0);
        Ok(())
    }

    fn emit_method(&mut self, class: &Class, method: &Method) -> Result<(), CodegenError> {
        self.mips
            .label(&Names::form_method(&class.name, &method.name));
        self.mips.prolog();
        self.enter_class_code(class);
        self.context
            .enter_method(method.formals.iter().map(|f| f.name.as_str()));
        self.emit_expr(&method.body)?;
        self.mips.epilog(method.formals.len());
        Ok(())
    }

    fn enter_class_code(&mut self, class: &Class) {
        self.current_class = class.name.clone();
        self.filename = class.filename.clone();
        let attrs = self.env.class_table.all_attributes_of(&class.name);
        self.context.set_attrs(attrs.iter().map(|attr| attr.name.as_str()));
    }

    fn next_label(&mut self) -> String {
        let label = format!("label_{}", self.label_index);
        self.label_index += 1;
        label
    }

    /// `SELF_TYPE` as seen from the class being emitted.
    fn resolve_static<'t>(&'t self, ty: &'t str) -> &'t str {
        if ty == Names::SELF_TYPE {
            &self.current_class
        } else {
            ty
        }
    }

    /// The typed default an absent initializer stands for: the shared
    /// zero constant for primitives, void for everything else.
    fn emit_default(&mut self, ty: &str) {
        match ty {
            _ if ty == Names::INT => {
                let label = self.consts.int_const(0);
                self.mips.la(Reg::Acc, &label);
            }
            _ if ty == Names::STRING => {
                let label = self.consts.str_const("");
                self.mips.la(Reg::Acc, &label);
            }
            _ if ty == Names::BOOL => {
                let label = self.consts.bool_const(false);
                self.mips.la(Reg::Acc, &label);
            }
            _ => {
                self.mips.mov(Reg::Acc, Reg::Zero);
            }
        }
    }

    /// Emits one expression; its result object ends up in `$a0`.
    fn emit_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Int(value) => {
                let label = self.consts.int_const(*value);
                self.mips.la(Reg::Acc, &label);
            }
            ExprKind::Str(lexeme) => {
                let content = lexeme.trim_matches('"');
                let label = self.consts.str_const(content);
                self.mips.la(Reg::Acc, &label);
            }
            ExprKind::Bool(value) => {
                let label = self.consts.bool_const(*value);
                self.mips.la(Reg::Acc, &label);
            }
            ExprKind::Id(name) => match self.resolve_id(name)? {
                Location::Local(offset) | Location::Formal(offset) => {
                    self.mips.lw(Reg::Acc, Addr(Reg::Fp, offset));
                }
                Location::Attr(offset) => {
                    self.mips.lw(Reg::Acc, Addr(Reg::S0, offset));
                }
                Location::SelfRef => {
                    self.mips.mov(Reg::Acc, Reg::S0);
                }
            },
            ExprKind::Assign { id, rhs } => {
                self.emit_expr(rhs)?;
                match self.resolve_id(id)? {
                    Location::Local(offset) | Location::Formal(offset) => {
                        self.mips.sw(Reg::Acc, Addr(Reg::Fp, offset));
                    }
                    Location::Attr(offset) => {
                        self.mips.sw(Reg::Acc, Addr(Reg::S0, offset));
                        self.mips.gen_gc_assign(offset);
                    }
                    Location::SelfRef => {
                        return Err(CodegenError::UnresolvedIdentifier(id.clone()));
                    }
                }
            }
            ExprKind::Paren(inner) => self.emit_expr(inner)?,
            ExprKind::NoExpr => {
                self.mips.mov(Reg::Acc, Reg::Zero);
            }
            ExprKind::Block { exprs } => {
                for e in exprs {
                    self.emit_expr(e)?;
                }
            }
            ExprKind::Dispatch { recv, method, args } => {
                self.emit_call(expr.line, recv, method, args, None)?;
            }
            ExprKind::StaticDispatch {
                recv,
                ty,
                method,
                args,
            } => {
                self.emit_call(expr.line, recv, method, args, Some(ty.as_str()))?;
            }
            ExprKind::New { ty } => self.emit_new(ty)?,
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let false_label = self.next_label();
                let end_label = self.next_label();
                self.emit_expr(cond)?;
                self.mips.lw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
                self.mips.beqz(Reg::T1, &false_label);
                self.emit_expr(then_branch)?;
                self.mips.b(&end_label);
                self.mips.label(&false_label);
                self.emit_expr(else_branch)?;
                self.mips.label(&end_label);
            }
            ExprKind::While { cond, body } => {
                let top_label = self.next_label();
                let end_label = self.next_label();
                self.mips.label(&top_label);
                self.emit_expr(cond)?;
                self.mips.lw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
                self.mips.beq(Reg::T1, Reg::Zero, &end_label);
                self.emit_expr(body)?;
                self.mips.b(&top_label);
                self.mips.label(&end_label);
                // a while expression is void
                self.mips.mov(Reg::Acc, Reg::Zero);
            }
            ExprKind::Let { id, ty, init, body } => {
                if init.is_no_expr() {
                    self.emit_default(ty);
                } else {
                    self.emit_expr(init)?;
                }
                self.mips.push(Reg::Acc);
                let slot = self.context.push_slot();
                self.context.enter_scope();
                self.context.bind(id, slot);
                self.emit_expr(body)?;
                self.context.exit_scope();
                self.context.pop_slot();
                self.mips.pop();
            }
            ExprKind::Case {
                scrutinee,
                branches,
            } => {
                self.emit_case(expr.line, scrutinee, branches)?;
            }
            ExprKind::Plus(lhs, rhs) => self.emit_arith(lhs, rhs, ArithOp::Add)?,
            ExprKind::Minus(lhs, rhs) => self.emit_arith(lhs, rhs, ArithOp::Sub)?,
            ExprKind::Mul(lhs, rhs) => self.emit_arith(lhs, rhs, ArithOp::Mul)?,
            ExprKind::Div(lhs, rhs) => self.emit_arith(lhs, rhs, ArithOp::Div)?,
            ExprKind::Neg(operand) => {
                self.emit_expr(operand)?;
                self.mips.jal(Names::OBJECT_COPY);
                self.mips.lw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
                self.mips.sub(Reg::T1, Reg::Zero, Reg::T1);
                self.mips.sw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
            }
            ExprKind::Lt(lhs, rhs) => self.emit_compare(lhs, rhs, false)?,
            ExprKind::Le(lhs, rhs) => self.emit_compare(lhs, rhs, true)?,
            ExprKind::Eq(lhs, rhs) => {
                self.emit_expr(lhs)?;
                self.mips.push(Reg::Acc);
                self.context.push_slot();
                self.emit_expr(rhs)?;
                self.context.pop_slot();
                self.mips.pop_into(Reg::T1);
                self.mips.mov(Reg::T2, Reg::Acc);
                let end_label = self.next_label();
                let true_const = self.consts.bool_const(true);
                let false_const = self.consts.bool_const(false);
                self.mips.la(Reg::Acc, &true_const);
                self.mips.beq(Reg::T1, Reg::T2, &end_label);
                self.mips.la(Reg::A1, &false_const);
                self.mips.jal(Names::EQUALITY_TEST);
                self.mips.label(&end_label);
            }
            ExprKind::Not(operand) => {
                self.emit_expr(operand)?;
                self.mips.lw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
                let end_label = self.next_label();
                let true_const = self.consts.bool_const(true);
                let false_const = self.consts.bool_const(false);
                self.mips.la(Reg::Acc, &true_const);
                self.mips.beqz(Reg::T1, &end_label);
                self.mips.la(Reg::Acc, &false_const);
                self.mips.label(&end_label);
            }
            ExprKind::IsVoid(operand) => {
                self.emit_expr(operand)?;
                self.mips.mov(Reg::T1, Reg::Acc);
                let end_label = self.next_label();
                let true_const = self.consts.bool_const(true);
                let false_const = self.consts.bool_const(false);
                self.mips.la(Reg::Acc, &true_const);
                self.mips.beqz(Reg::T1, &end_label);
                self.mips.la(Reg::Acc, &false_const);
                self.mips.label(&end_label);
            }
        }
        Ok(())
    }

    fn resolve_id(&self, name: &str) -> Result<Location, CodegenError> {
        self.context
            .resolve(name)
            .ok_or_else(|| CodegenError::UnresolvedIdentifier(name.to_string()))
    }

    /// Dynamic and static dispatch share everything but the table load.
    fn emit_call(
        &mut self,
        line: u32,
        recv: &Expr,
        method: &str,
        args: &[Expr],
        static_type: Option<&str>,
    ) -> Result<(), CodegenError> {
        for arg in args {
            self.emit_expr(arg)?;
            self.mips.push(Reg::Acc);
            self.context.push_slot();
        }
        self.emit_expr(recv)?;
        for _ in args {
            // the callee's epilog pops the arguments
            self.context.pop_slot();
        }

        let ok_label = self.next_label();
        let file_const = {
            let filename = self.filename.clone();
            self.consts.str_const(&filename)
        };
        self.mips.bne(Reg::Acc, Reg::Zero, &ok_label);
        self.mips.la(Reg::Acc, &file_const);
        self.mips.li(Reg::T1, line);
        self.mips.jal(Names::DISPATCH_ABORT);
        self.mips.label(&ok_label);

        let table_class = match static_type {
            Some(ty) => {
                self.mips.la(Reg::T1, &Names::form_disp_table(ty));
                ty.to_string()
            }
            None => {
                self.mips.lw(Reg::T1, Addr(Reg::Acc, DISPTAB_OFFSET));
                self.resolve_static(&recv.result_type).to_string()
            }
        };
        let offset = self
            .env
            .method_env
            .method_offset(&table_class, method)
            .ok_or_else(|| CodegenError::UnknownMethodOffset {
                class: table_class.clone(),
                method: method.to_string(),
            })?;
        self.mips.lw(Reg::T1, Addr(Reg::T1, 4 * offset as i32));
        self.mips.jalr(Reg::T1);
        Ok(())
    }

    fn emit_new(&mut self, ty: &str) -> Result<(), CodegenError> {
        if ty == Names::SELF_TYPE {
            // Index class_objTab by the receiver's tag; each entry is a
            // (protObj, init) pair, hence the shift by 3.
            self.mips.la(Reg::T1, Names::OBJ_TAB);
            self.mips.lw(Reg::T2, Addr(Reg::S0, 0));
            self.mips.sll(Reg::T2, Reg::T2, 3);
            self.mips.addu(Reg::T1, Reg::T1, Reg::T2);
            self.mips.mov(Reg::T5, Reg::T1);
            self.mips.lw(Reg::Acc, Addr(Reg::T1, 0));
            self.mips.jal(Names::OBJECT_COPY);
            self.mips.lw(Reg::T1, Addr(Reg::T5, 4));
            self.mips.jalr(Reg::T1);
        } else {
            self.mips.la(Reg::Acc, &Names::form_prot_obj(ty));
            self.mips.jal(Names::OBJECT_COPY);
            self.mips.jal(&Names::form_init(ty));
        }
        Ok(())
    }

    /// Typecase: tag-range tests, most specific class first.
    fn emit_case(
        &mut self,
        line: u32,
        scrutinee: &Expr,
        branches: &[coolc_par::CaseBranch],
    ) -> Result<(), CodegenError> {
        self.emit_expr(scrutinee)?;

        let ok_label = self.next_label();
        let file_const = {
            let filename = self.filename.clone();
            self.consts.str_const(&filename)
        };
        self.mips.bne(Reg::Acc, Reg::Zero, &ok_label);
        self.mips.la(Reg::Acc, &file_const);
        self.mips.li(Reg::T1, line);
        self.mips.jal(Names::CASE_ON_VOID);
        self.mips.label(&ok_label);

        // The matched object stays in a stack slot for the branch body.
        self.mips.push(Reg::Acc);
        let slot = self.context.push_slot();
        self.mips.lw(Reg::T1, Addr(Reg::Acc, 0));

        // Deeper classes have higher tags, so descending tag order tests
        // the most specific branch first.
        let mut ordered: Vec<(usize, usize, &coolc_par::CaseBranch)> = branches
            .iter()
            .map(|branch| {
                let ty = self.resolve_static(&branch.ty);
                (
                    self.tags.tag(ty),
                    self.tags.last_descendant(ty),
                    branch,
                )
            })
            .collect();
        ordered.sort_by_key(|(tag, _, _)| std::cmp::Reverse(*tag));

        let end_label = self.next_label();
        for (first, last, branch) in ordered {
            let next_label = self.next_label();
            self.mips.blti(Reg::T1, first, &next_label);
            self.mips.bgti(Reg::T1, last, &next_label);
            self.context.enter_scope();
            self.context.bind(&branch.id, slot);
            self.emit_expr(&branch.body)?;
            self.context.exit_scope();
            self.mips.b(&end_label);
            self.mips.label(&next_label);
        }
        // No branch matched; the object is still in the accumulator.
        self.mips.jal(Names::CASE_NO_MATCH);
        self.mips.label(&end_label);
        self.context.pop_slot();
        self.mips.pop();
        Ok(())
    }

    /// `lhs op rhs` on unboxed `Int` payloads; the result reuses a copy
    /// of the rhs object so shared literals are never mutated.
    fn emit_arith(&mut self, lhs: &Expr, rhs: &Expr, op: ArithOp) -> Result<(), CodegenError> {
        self.emit_expr(lhs)?;
        self.mips.push(Reg::Acc);
        self.context.push_slot();
        self.emit_expr(rhs)?;
        self.context.pop_slot();
        self.mips.jal(Names::OBJECT_COPY);
        self.mips.pop_into(Reg::T1);
        self.mips.lw(Reg::T1, Addr(Reg::T1, PAYLOAD_OFFSET));
        self.mips.lw(Reg::T2, Addr(Reg::Acc, PAYLOAD_OFFSET));
        match op {
            ArithOp::Add => self.mips.add(Reg::T1, Reg::T1, Reg::T2),
            ArithOp::Sub => self.mips.sub(Reg::T1, Reg::T1, Reg::T2),
            ArithOp::Mul => self.mips.mul(Reg::T1, Reg::T1, Reg::T2),
            ArithOp::Div => self.mips.div(Reg::T1, Reg::T1, Reg::T2),
        };
        self.mips.sw(Reg::T1, Addr(Reg::Acc, PAYLOAD_OFFSET));
        Ok(())
    }

    /// `<` / `<=` on `Int` payloads, loading a boolean constant.
    fn emit_compare(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        or_equal: bool,
    ) -> Result<(), CodegenError> {
        self.emit_expr(lhs)?;
        self.mips.push(Reg::Acc);
        self.context.push_slot();
        self.emit_expr(rhs)?;
        self.context.pop_slot();
        self.mips.pop_into(Reg::T1);
        self.mips.lw(Reg::T1, Addr(Reg::T1, PAYLOAD_OFFSET));
        self.mips.lw(Reg::T2, Addr(Reg::Acc, PAYLOAD_OFFSET));
        let end_label = self.next_label();
        let true_const = self.consts.bool_const(true);
        let false_const = self.consts.bool_const(false);
        self.mips.la(Reg::Acc, &true_const);
        if or_equal {
            self.mips.ble(Reg::T1, Reg::T2, &end_label);
        } else {
            self.mips.blt(Reg::T1, Reg::T2, &end_label);
        }
        self.mips.la(Reg::Acc, &false_const);
        self.mips.label(&end_label);
        Ok(())
    }

    /// Emits the data segment: runtime tags, collector configuration,
    /// prototypes, constants and the class tables.
    fn finish(&mut self) {
        self.mips.set_data_mode();

        self.mips
            .global("_int_tag")
            .global("_bool_tag")
            .global("_string_tag")
            .label("_int_tag")
            .word(self.tags.tag(Names::INT))
            .label("_bool_tag")
            .word(self.tags.tag(Names::BOOL))
            .label("_string_tag")
            .word(self.tags.tag(Names::STRING));

        self.mips
            .global("_MemMgr_INITIALIZER")
            .label("_MemMgr_INITIALIZER")
            .word("_GenGC_Init")
            .global("_MemMgr_COLLECTOR")
            .label("_MemMgr_COLLECTOR")
            .word("_GenGC_Collect")
            .global("_MemMgr_TEST")
            .label("_MemMgr_TEST")
            .word(1);

        // Class-name constants must exist before the pool serializes.
        let name_consts: Vec<String> = self
            .prototypes
            .iter()
            .map(|proto| proto.name().to_string())
            .collect();
        let name_labels: Vec<String> = name_consts
            .iter()
            .map(|name| self.consts.str_const(name))
            .collect();

        for proto in &self.prototypes {
            proto.serialize(&mut self.mips);
        }
        self.consts.serialize(
            &mut self.mips,
            self.tags.tag(Names::INT),
            self.tags.tag(Names::BOOL),
            self.tags.tag(Names::STRING),
        );

        self.mips.global(Names::NAME_TAB).label(Names::NAME_TAB);
        for label in &name_labels {
            self.mips.word(label);
        }

        self.mips.label(Names::OBJ_TAB);
        for proto in &self.prototypes {
            self.mips
                .word(Names::form_prot_obj(proto.name()))
                .word(Names::form_init(proto.name()));
        }

        for table in &self.dispatch_tables {
            table.serialize(&mut self.mips);
        }
    }
}

#[derive(Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}
