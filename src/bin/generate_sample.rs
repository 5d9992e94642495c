//! Writes `sample_movies.csv`: a small TMDB-shaped catalog with every kind of
//! cell the normaliser has to cope with.

const GENRES: &[(i64, &str)] = &[
    (16, "Animation"),
    (35, "Comedy"),
    (18, "Drama"),
    (28, "Action"),
    (10749, "Romance"),
    (878, "Science Fiction"),
];

const COMPANIES: &[(i64, &str)] = &[
    (3, "Pixar Animation Studios"),
    (4, "Paramount Pictures"),
    (1957, "Lions Gate Films"),
    (7505, "Marvel Entertainment"),
];

const COUNTRIES: &[(&str, &str)] = &[
    ("US", "United States of America"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("JP", "Japan"),
];

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("ja", "日本語"),
];

const COLLECTIONS: &[(i64, &str)] = &[
    (10194, "Toy Story Collection"),
    (119050, "Grumpy Old Men Collection"),
    (304, "Ocean's Collection"),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Python-style quoting: single quotes unless the text contains one.
fn py_str(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{s}\"")
    } else {
        format!("'{s}'")
    }
}

/// A literal list of 0..=max distinct picks from `items`.
fn pick_list<K>(
    rng: &mut SimpleRng,
    items: &[(K, &str)],
    max: usize,
    id_key: &str,
    render_key: impl Fn(&K) -> String,
) -> String {
    let count = rng.below(max + 1);
    let mut picked: Vec<usize> = Vec::new();
    while picked.len() < count.min(items.len()) {
        let i = rng.below(items.len());
        if !picked.contains(&i) {
            picked.push(i);
        }
    }
    let entries: Vec<String> = picked
        .iter()
        .map(|&i| {
            let (key, name) = &items[i];
            format!("{{'{id_key}': {}, 'name': {}}}", render_key(key), py_str(name))
        })
        .collect();
    format!("[{}]", entries.join(", "))
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_movies.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");

    writer
        .write_record([
            "adult",
            "belongs_to_collection",
            "budget",
            "genres",
            "id",
            "original_title",
            "overview",
            "popularity",
            "poster_path",
            "production_companies",
            "production_countries",
            "release_date",
            "revenue",
            "runtime",
            "spoken_languages",
            "status",
            "tagline",
            "title",
            "video",
        ])
        .expect("Failed to write header");

    let n_movies = 200;
    for id in 1..=n_movies {
        let collection = if rng.chance(0.25) {
            let (cid, name) = COLLECTIONS[rng.below(COLLECTIONS.len())];
            format!(
                "{{'id': {cid}, 'name': {}, 'poster_path': '/c{cid}.jpg', 'backdrop_path': '/b{cid}.jpg'}}",
                py_str(name)
            )
        } else {
            String::new()
        };

        let mut genres = pick_list(&mut rng, GENRES, 3, "id", |k| k.to_string());
        let companies = pick_list(&mut rng, COMPANIES, 2, "id", |k| k.to_string());
        let countries = pick_list(&mut rng, COUNTRIES, 2, "iso_3166_1", |k| py_str(k));
        let languages = pick_list(&mut rng, LANGUAGES, 2, "iso_639_1", |k| py_str(k));

        // a few corrupted cells, as in the real dump
        if rng.chance(0.03) {
            genres.truncate(genres.len() / 2);
        }
        let budget = if rng.chance(0.05) {
            "not_a_number".to_string()
        } else {
            format!("{:.3}", rng.next_f64() * 2e8)
        };
        let release_date = if rng.chance(0.05) {
            String::new()
        } else {
            format!("{}-{:02}-{:02}", 1950 + rng.below(70), 1 + rng.below(12), 1 + rng.below(28))
        };

        let record = [
            "False".to_string(),
            collection,
            budget,
            genres,
            id.to_string(),
            format!("Original Title {id}"),
            format!("Overview of movie {id}, with a comma."),
            format!("{:.6}", rng.next_f64() * 50.0),
            format!("/p{id}.jpg"),
            companies,
            countries,
            release_date,
            format!("{}", rng.below(500_000_000)),
            format!("{}.0", 70 + rng.below(100)),
            languages,
            "Released".to_string(),
            String::new(),
            format!("Movie {id}"),
            "False".to_string(),
        ];
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {n_movies} movies to {output_path}");
}
