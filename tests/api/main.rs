mod health_check;
mod helpers;

// all api tests are bundled into a single binary: while each test executable is
// compiled in parallel, linking is sequential
