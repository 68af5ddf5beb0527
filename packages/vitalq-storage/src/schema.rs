pub fn render_relational_schema() -> String {
	expand_includes(include_str!("../../../sql/relational.sql"))
}

pub fn render_document_schema() -> String {
	expand_includes(include_str!("../../../sql/documents.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_patient_fullnames.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_patient_fullnames.sql")),
				"tables/002_patient_grants.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_patient_grants.sql")),
				"tables/003_llm_base_prompts.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_llm_base_prompts.sql")),
				"tables/004_llm_tools.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_llm_tools.sql")),
				"tables/010_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_documents.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
