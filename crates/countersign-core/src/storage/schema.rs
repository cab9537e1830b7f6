pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS signatures (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  owner_type TEXT NOT NULL,
  owner_id INTEGER NOT NULL,
  user_id INTEGER NOT NULL,
  physician_id INTEGER,
  effective_date TEXT,
  static_role TEXT,
  static_name TEXT NOT NULL,
  static_user_name TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_signatures_owner ON signatures(owner_type, owner_id);
CREATE INDEX IF NOT EXISTS idx_signatures_physician ON signatures(physician_id);
"#;
