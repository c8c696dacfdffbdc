use super::identifier_deriver::split_camel;
use super::schema_merger::{table_columns, table_symbols, Column};
use super::text_patcher::canonical_driver_line;
use crate::data::{FeatureRequest, FileEdit, FilePlan, ScaffoldRequirement};
use crate::registries::{ContextKind, ProjectContext, ProjectLayout};

const SAMPLE_ROWS: usize = 3;

/// Fills in the scaffold files neither the model output nor the project
/// already provides.
pub struct ScaffoldSynthesizer<'a> {
    layout: &'a ProjectLayout,
    context: &'a ProjectContext,
}

impl<'a> ScaffoldSynthesizer<'a> {
    pub fn new(layout: &'a ProjectLayout, context: &'a ProjectContext) -> Self {
        Self { layout, context }
    }

    /// Appends one templated edit to `plan` for every missing requirement and
    /// returns how many were added.
    pub fn fill(&self, plan: &mut FilePlan, features: &[FeatureRequest]) -> usize {
        let requirements = ScaffoldRequirement::for_features(features);
        let missing: Vec<&ScaffoldRequirement> = requirements
            .iter()
            .filter(|req| !self.is_present(plan, req))
            .collect();

        let schema = self.schema_text(plan);
        let mut added = 0;
        for requirement in missing {
            let edit = match requirement {
                ScaffoldRequirement::ConnectionBootstrap => Some(FileEdit::new(
                    self.layout.connection_path.clone(),
                    self.connection_template(),
                )),
                ScaffoldRequirement::SchemaSync => self
                    .sync_template(&schema)
                    .map(|content| FileEdit::new(self.layout.sync_path.clone(), content)),
                ScaffoldRequirement::SeedData => self
                    .seed_template(&schema, features)
                    .map(|content| FileEdit::new(self.layout.seed_path.clone(), content)),
                ScaffoldRequirement::RouteHandler(feature) => Some(FileEdit::new(
                    self.layout.route_path(&feature.route_name),
                    self.route_template(feature),
                )),
            };

            match edit {
                Some(edit) => {
                    let path = edit.path.clone();
                    if plan.push(edit) {
                        tracing::info!("+ synthesized {} scaffold at {}", requirement.kind().label(), path);
                        added += 1;
                    }
                }
                None => tracing::debug!(
                    "no schema symbols known, skipping {} scaffold",
                    requirement.kind().label()
                ),
            }
        }
        added
    }

    fn is_present(&self, plan: &FilePlan, requirement: &ScaffoldRequirement) -> bool {
        let fixed = |path: &str| plan.contains(path) || self.context.mentions(path);
        match requirement {
            ScaffoldRequirement::ConnectionBootstrap => fixed(&self.layout.connection_path),
            ScaffoldRequirement::SchemaSync => fixed(&self.layout.sync_path),
            ScaffoldRequirement::SeedData => fixed(&self.layout.seed_path),
            ScaffoldRequirement::RouteHandler(feature) => {
                plan.iter()
                    .any(|e| self.is_route_handler(plan, &e.path) && e.path.contains(&feature.route_name))
                    || self.context.mentions(&self.layout.route_path(&feature.route_name))
            }
        }
    }

    /// A `route.*` file somewhere under the api directory.
    fn is_route_handler(&self, plan: &FilePlan, path: &str) -> bool {
        let key = plan.key(path);
        let api = format!("{}/", plan.key(&self.layout.api_dir));
        let file = key.rsplit('/').next().unwrap_or(&key);
        key.starts_with(&api) && file.split('.').next() == Some("route")
    }

    /// Existing schema text followed by whatever schema the model produced.
    fn schema_text(&self, plan: &FilePlan) -> String {
        let existing = self.context.content(ContextKind::Schema).unwrap_or("");
        let planned = plan
            .get(&self.layout.schema_path)
            .map(|e| e.content.as_str())
            .unwrap_or("");
        format!("{}\n{}", existing, planned)
    }

    fn sibling_import(&self, path: &str) -> String {
        let file = path.rsplit('/').next().unwrap_or(path);
        let stem = file.split('.').next().unwrap_or(file);
        format!("./{}{}", stem, self.layout.import_extension)
    }

    fn alias_import(&self, path: &str) -> String {
        let display = self.layout.display_path(path);
        let stem = display.rsplit_once('.').map(|(s, _)| s).unwrap_or(&display);
        format!("@/{}{}", stem, self.layout.import_extension)
    }

    pub fn connection_template(&self) -> String {
        format!(
            "import path from 'path';\n\
             import {{ drizzle }} from 'drizzle-orm/better-sqlite3';\n\
             import Database from 'better-sqlite3';\n\
             \n\
             {}\n\
             export const db = drizzle(sqlite);\n",
            canonical_driver_line("const sqlite", self.layout)
        )
    }

    pub fn sync_template(&self, schema: &str) -> Option<String> {
        let mut symbols = table_symbols(schema);
        dedup_in_order(&mut symbols);
        if symbols.is_empty() {
            return None;
        }

        let mut out = format!(
            "import {{ db }} from '{}';\nimport {{ {} }} from '{}';\n\n",
            self.sibling_import(&self.layout.connection_path),
            symbols.join(", "),
            self.sibling_import(&self.layout.schema_path)
        );
        for symbol in &symbols {
            out.push_str(&format!("db.select().from({}).limit(1).all();\n", symbol));
        }
        out.push_str(&format!(
            "\nconsole.log('Synced schema: {} table(s) ensured.');\n",
            symbols.len()
        ));
        Some(out)
    }

    pub fn seed_template(&self, schema: &str, features: &[FeatureRequest]) -> Option<String> {
        let symbol = features
            .first()
            .map(|f| f.symbol_name.clone())
            .or_else(|| table_symbols(schema).into_iter().next())?;

        let columns: Vec<Column> = table_columns(schema, &symbol)
            .into_iter()
            .filter(|c| !c.primary_key)
            .collect();
        let rows: Vec<String> = (1..=SAMPLE_ROWS)
            .map(|i| format!("      {},", sample_row(&columns, i)))
            .collect();

        Some(format!(
            "import {{ db }} from '{conn}';\n\
             import {{ {sym} }} from '{schema}';\n\
             \n\
             async function seed() {{\n\
             \x20 try {{\n\
             \x20   await db.delete({sym});\n\
             \x20   await db.insert({sym}).values([\n\
             {rows}\n\
             \x20   ]);\n\
             \x20   console.log('Seeded {sym} with {count} sample rows.');\n\
             \x20 }} catch (error) {{\n\
             \x20   console.error('Error seeding {sym}:', error);\n\
             \x20 }}\n\
             }}\n\
             \n\
             seed();\n",
            conn = self.sibling_import(&self.layout.connection_path),
            schema = self.sibling_import(&self.layout.schema_path),
            sym = symbol,
            rows = rows.join("\n"),
            count = SAMPLE_ROWS,
        ))
    }

    pub fn route_template(&self, feature: &FeatureRequest) -> String {
        let words = split_camel(&feature.symbol_name).to_lowercase();
        format!(
            "import {{ db }} from '{conn}';\n\
             import {{ {sym} }} from '{schema}';\n\
             import {{ NextResponse }} from 'next/server';\n\
             \n\
             export async function GET() {{\n\
             \x20 try {{\n\
             \x20   const rows = await db.select().from({sym});\n\
             \x20   return NextResponse.json({{ data: rows }}, {{ status: 200 }});\n\
             \x20 }} catch (error) {{\n\
             \x20   console.error('Error fetching {words}:', error);\n\
             \x20   return NextResponse.json({{ error: 'Failed to fetch {words}' }}, {{ status: 500 }});\n\
             \x20 }}\n\
             }}\n\
             \n\
             export async function POST(request: Request) {{\n\
             \x20 try {{\n\
             \x20   const body = await request.json();\n\
             \x20   const inserted = await db.insert({sym}).values(body).returning();\n\
             \x20   return NextResponse.json({{ data: inserted }}, {{ status: 201 }});\n\
             \x20 }} catch (error) {{\n\
             \x20   console.error('Error adding to {words}:', error);\n\
             \x20   return NextResponse.json({{ error: 'Failed to add to {words}' }}, {{ status: 500 }});\n\
             \x20 }}\n\
             }}\n",
            conn = self.alias_import(&self.layout.connection_path),
            schema = self.alias_import(&self.layout.schema_path),
            sym = feature.symbol_name,
            words = words,
        )
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

fn sample_row(columns: &[Column], i: usize) -> String {
    if columns.is_empty() {
        return format!("{{ name: 'Sample item {}' }}", i);
    }
    let fields: Vec<String> = columns
        .iter()
        .map(|c| format!("{}: {}", c.name, sample_value(c, i)))
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

fn sample_value(column: &Column, i: usize) -> String {
    if column.timestamp {
        return "new Date()".to_string();
    }
    match column.column_type.as_str() {
        "integer" | "int" | "serial" | "numeric" => i.to_string(),
        "real" => format!("{}.5", i),
        "boolean" => (i % 2 == 1).to_string(),
        _ => format!("'Sample {} {}'", split_camel(&column.name).to_lowercase(), i),
    }
}
