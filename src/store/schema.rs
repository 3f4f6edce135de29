//! SQLite schema and seed data

pub const SCHEMA: &str = r#"
-- ============================================
-- ENTRIES
-- ============================================

-- One user observation. Vocabulary references are advisory (no hard FKs):
-- an entry may outlive whatever the UI offered when it was written.
CREATE TABLE IF NOT EXISTS entry (
    id TEXT PRIMARY KEY,                   -- UUID
    title TEXT,
    category_id INTEGER,
    material_id INTEGER,
    surface_id INTEGER,
    description TEXT,
    city TEXT,
    district TEXT,
    creator_hash TEXT NOT NULL,
    near_photo_path TEXT,
    far_photo_path TEXT,
    created_at INTEGER NOT NULL,           -- wall-clock millis
    updated_at INTEGER NOT NULL
);

-- ============================================
-- VOCABULARY
-- ============================================

-- Display names may be Arabic; alt_name is the optional Latin name.
CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    alt_name TEXT,
    user_defined BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS material (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    alt_name TEXT,
    user_defined BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS surface (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    user_defined BOOLEAN NOT NULL DEFAULT FALSE
);

-- Allow-list of materials suggested for a category. Advisory only.
CREATE TABLE IF NOT EXISTS category_material (
    category_id INTEGER NOT NULL,
    material_id INTEGER NOT NULL,
    PRIMARY KEY (category_id, material_id)
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_entry_created ON entry(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_category_material_cat ON category_material(category_id);
"#;

/// Install-time vocabulary. Fixed ids, re-run safe: seeded rows are never
/// renumbered, user additions continue from the autoincrement counter.
pub const SEED: &str = r#"
INSERT OR IGNORE INTO category(id, name, alt_name, user_defined) VALUES
    (1, 'نقش', 'Incisura', 0),
    (2, 'غرافيتي', 'Graffiti', 0),
    (3, 'منحوتة', 'Sculptura', 0),
    (4, 'لوحة', 'Tabula', 0),
    (5, 'ملصق', 'Poster', 0);

INSERT OR IGNORE INTO material(id, name, alt_name, user_defined) VALUES
    (1, 'حجر', 'Lapis', 0),
    (2, 'معدن', 'Metallum', 0),
    (3, 'خشب', 'Lignum', 0),
    (4, 'دهان رذاذ', 'Aerosol', 0),
    (5, 'حبر', 'Atramentum', 0);

INSERT OR IGNORE INTO surface(id, name, user_defined) VALUES
    (1, 'حجر', 0),
    (2, 'معدن', 0),
    (3, 'خشب', 0),
    (4, 'خرسانة', 0),
    (5, 'قرميد', 0);

INSERT OR IGNORE INTO category_material(category_id, material_id) VALUES
    (1, 1), (1, 2), (1, 3), (1, 4),
    (2, 4),
    (3, 1), (3, 2), (3, 3),
    (4, 4), (4, 5),
    (5, 5);
"#;
