use std::collections::BTreeSet;

use common::{AuthorId, CategoryId, EntityId, GenreId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{
    Book, BookChanges, BookFormat, BookMapper, ChangeRequestMerger, Mapper, NewBook, Patch,
    Repository, schema,
};
use store::Row;

fn new_book(authors: usize, genres: usize) -> NewBook {
    NewBook {
        title: "Dune".to_string(),
        isbn: "9780441013593".to_string(),
        publisher: "Ace".to_string(),
        release_year: 1965,
        language: "English".to_string(),
        translator: String::new(),
        format: BookFormat::Paperback,
        pages: 896,
        image_url: None,
        category_id: CategoryId::new(),
        author_ids: (0..authors).map(|_| AuthorId::new()).collect(),
        genre_ids: (0..genres).map(|_| GenreId::new()).collect(),
    }
}

fn joined_rows(book: &Book) -> Vec<Row> {
    let base = BookMapper::map_to_persistence(book);
    book.authors()
        .iter()
        .flat_map(|author| {
            let base = base.clone();
            book.genres().iter().map(move |genre| {
                base.clone()
                    .with("author_id", author.as_uuid())
                    .with("genre_id", genre.as_uuid())
            })
        })
        .collect()
}

fn bench_map_with_joins(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain/map_raw_with_joins");

    for size in [1, 5, 20] {
        let book = Book::create(new_book(size, size)).unwrap();
        let rows = joined_rows(&book);

        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| BookMapper::map_raw_with_joins_to_domain(rows).unwrap());
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let book = Book::create(new_book(3, 0)).unwrap();
    let changes = BookChanges {
        title: Patch::Present("Dune Messiah".to_string()),
        pages: Patch::Present(256),
        author_ids: Patch::Present(BTreeSet::from([AuthorId::new()])),
        ..Default::default()
    };

    c.bench_function("domain/merge_change_request", |b| {
        b.iter(|| {
            let mut staged = book.clone();
            ChangeRequestMerger::apply_changes(&mut staged, &changes).unwrap()
        });
    });
}

fn bench_save(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = schema::in_memory_store();
    let books = Repository::<_, BookMapper>::new(store);
    let mut book = Book::create(new_book(2, 2)).unwrap();
    rt.block_on(async { books.create(&mut book).await.unwrap() });

    c.bench_function("domain/save_title_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                book.update_title("Dune").unwrap();
                books.save(&mut book).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_map_with_joins, bench_merge, bench_save);
criterion_main!(benches);
