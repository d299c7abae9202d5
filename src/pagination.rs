use serde::Serialize;

/// One page of an ordered result set.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub object_list: Vec<T>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

/// Number of pages for `count` items; an empty set still has one page.
pub fn num_pages(count: usize, page_size: usize) -> usize {
    if count == 0 {
        1
    } else {
        count.div_ceil(page_size.max(1))
    }
}

/// Resolves the requested page number.
///
/// Missing or non-integer input selects page 1. Anything below 1 or past the
/// end selects the last page, including integers too large for `i64`.
pub fn resolve_page_number(requested: Option<&str>, num_pages: usize) -> usize {
    let Some(raw) = requested.map(str::trim) else {
        return 1;
    };
    match raw.parse::<i64>() {
        Ok(n) if n < 1 || n as u64 > num_pages as u64 => num_pages,
        Ok(n) => n as usize,
        Err(_) if is_integer_literal(raw) => num_pages,
        Err(_) => 1,
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn paginate<T>(items: Vec<T>, page_size: usize, requested: Option<&str>) -> Page<T> {
    let page_size = page_size.max(1);
    let count = items.len();
    let num_pages = num_pages(count, page_size);
    let number = resolve_page_number(requested, num_pages);

    let object_list = items
        .into_iter()
        .skip((number - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        number,
        num_pages,
        count,
        has_next: number < num_pages,
        has_previous: number > 1,
        object_list,
    }
}
